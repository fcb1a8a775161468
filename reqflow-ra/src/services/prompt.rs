//! Prompt construction for requirement analysis rounds
//!
//! The prompt carries the full prior genome and the raw feedback so the
//! model can reconcile contradictions, favoring newer information, and
//! re-derive the complete requirement set from the conversation history.

use reqflow_common::genome::RequirementGenome;

/// Build the analysis prompt for one refinement round
pub fn build_analysis_prompt(state: &RequirementGenome, feedback: &str) -> String {
    let state_json =
        serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string());
    let next_round = state.round + 1;
    let first_round_note = if state.round == 0 {
        "This is the FIRST round: build the genome from scratch."
    } else {
        "This is NOT the first round: integrate new information with the existing requirements."
    };

    format!(
        r#"You are a 'Requirements Analysis Expert'. Your task is to understand user requirements, identify ambiguities, and generate structured requirement documents.

Current Requirement State: {state_json}
User Input: "{feedback}"

Task:
1. **Understand & Parse Requirements**:
   - Extract key functional requirements, user stories, and constraints from the user input
   - {first_round_note}
   - Identify any contradictions and resolve them (prioritize newer information)

2. **Identify Ambiguities**:
   - Determine if there are unclear points that need clarification
   - Generate specific clarification questions if needed
   - If requirements are clear enough, proceed to document generation

3. **Update Requirement Genome**:
   - Update 'features' list: Extract distinct functional features
   - Update 'user_stories' list: Create user stories in format "As a [role], I want [goal] so that [benefit]"
   - Update 'constraints' list: Identify technical, business, or other constraints
   - Update 'requirements_summary': Create a 2-3 sentence summary in Markdown
   - Ensure the genome reflects the FULL conversation history

4. **Generate Structured Document** (only if status="completed"):
   - If requirements are clear and complete, generate a full JSON requirement document
   - If clarifications are needed, set status="clarifying" and provide questions

Output Format: Respond ONLY with valid JSON.

Example Output (when clarifying):
{{
  "status": "clarifying",
  "updated_state": {{
    "round": {next_round},
    "requirements_summary": "Summary of understood requirements so far...",
    "features": ["Feature 1", "Feature 2"],
    "user_stories": [
      {{"id": "US-1", "title": "User Story Title", "description": "As a... I want... so that..."}}
    ],
    "constraints": ["Constraint 1", "Constraint 2"],
    "clarifications_needed": ["Question 1", "Question 2"]
  }}
}}

Example Output (when completed):
{{
  "status": "completed",
  "updated_state": {{
    "round": {next_round},
    "requirements_summary": "Complete summary of all requirements...",
    "features": ["Feature 1", "Feature 2"],
    "user_stories": [
      {{"id": "US-1", "title": "...", "description": "...", "acceptance_criteria": ["..."], "priority": "high"}}
    ],
    "constraints": ["Constraint 1"],
    "clarifications_needed": []
  }},
  "document": {{
    "project": {{
      "name": "Project Name",
      "description": "Project description"
    }},
    "user_stories": [
      {{
        "id": "US-1",
        "title": "User Story Title",
        "description": "As a [role], I want [goal] so that [benefit]",
        "acceptance_criteria": ["Criterion 1", "Criterion 2"],
        "priority": "high"
      }}
    ],
    "features": [
      {{
        "id": "F-1",
        "name": "Feature Name",
        "description": "Feature description",
        "related_user_stories": ["US-1"]
      }}
    ],
    "constraints": ["Constraint 1"],
    "technical_requirements": [],
    "non_functional_requirements": []
  }}
}}"#
    )
}
