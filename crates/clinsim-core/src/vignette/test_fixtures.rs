//! Shared vignette fixtures for tests across the workspace.
//!
//! A small three-phase disclosure scenario: the trainee must open the
//! conversation, disclose a delayed diagnosis, and work toward resolution
//! with an escalating family member.

use super::model::Vignette;

/// TOML source of the sample vignette.
pub fn sample_vignette_toml() -> String {
    r#"
id = "delayed-diagnosis"
title = "Disclosing a Delayed Diagnosis"
description = "Family meeting after a missed lab result delayed treatment."

[[phases]]
id = "opening"
name = "Opening"
duration = "3 minutes"
objective = "Establish rapport and set the agenda for the meeting."
message_budget = 6

[[phases.learner_objectives]]
text = "Introduce yourself and your role"
trigger_keywords = ["my name is", "i am the", "i'm the"]

[[phases.learner_objectives]]
text = "Acknowledge the family's concern"
trigger_keywords = ["i understand", "i can see", "that must be"]

[[phases.branch_points]]
condition = "defensive"
next_phase = "disclosure"
emotional_delta = 0.2
description = "Deflecting early pushes the family straight to demands for answers."

[[phases]]
id = "disclosure"
name = "Disclosure"
duration = "5 minutes"
objective = "Disclose the delay plainly and take responsibility."
critical = true
message_budget = 8
focus = "What happened and when it was discovered"
information_boundary = "Do not volunteer the root-cause analysis findings yet."

[[phases.learner_objectives]]
text = "State what happened without euphemism"
trigger_keywords = ["the result was missed", "there was a delay", "we failed to"]

[[phases.learner_objectives]]
text = "Offer a sincere apology"
trigger_keywords = ["i am sorry", "i'm sorry", "i apologize"]

[[phases.branch_points]]
condition = "clear_empathetic"
next_phase = "resolution"
emotional_delta = -0.15

[[phases.branch_points]]
condition = "medical_jargon"
next_phase = "disclosure"
emotional_delta = 0.1
description = "Jargon keeps the family stuck demanding a plain answer."

[[phases]]
id = "resolution"
name = "Resolution"
duration = "4 minutes"
objective = "Agree on next steps and follow-up."

[[phases.learner_objectives]]
text = "Describe the corrective plan"
trigger_keywords = ["next step", "going forward", "we will"]

[assessment]
excellence_score = 0.85
passing_score = 0.7

[assessment.empathy]
patterns = ["emotional acknowledgment", "active listening"]
anti_patterns = ["dismissive language"]
weight = 0.4

[assessment.clarity]
patterns = ["plain language explanation"]
anti_patterns = ["medical jargon"]
weight = 0.3

[assessment.accountability]
patterns = ["direct apology", "no blame shifting"]
anti_patterns = ["defensive responses"]
weight = 0.3

[emotional_tracking]
baseline_label = "calm"

[[emotional_tracking.thresholds]]
label = "concerned"
cut = 0.25

[[emotional_tracking.thresholds]]
label = "upset"
cut = 0.5

[[emotional_tracking.thresholds]]
label = "angry"
cut = 0.75

[[emotional_tracking.thresholds]]
label = "hostile"
cut = 0.9

[emotional_tracking.modifiers]
empathetic_response = -0.1
clear_explanation = -0.08
apology = -0.12
medical_jargon = 0.08
defensive_response = 0.15

[character]
name = "Margaret"
identity = "Daughter of the patient, holds healthcare power of attorney"
personality = "Protective, detail-oriented, quick to anger when stonewalled"
vocabulary_style = "Plain-spoken, distrusts clinical terms"

[character.difficulty_profiles.easy]
traits = ["gives the trainee room to speak"]
emotional_range = "concerned to upset"
response_tendencies = ["asks clarifying questions"]

[character.difficulty_profiles.hard]
traits = ["interrupts frequently", "quotes prior conversations back"]
emotional_range = "upset to hostile"
trigger_phrases = ["these things happen", "policy"]
response_tendencies = ["demands names and dates", "threatens to escalate"]

[[revelation_stages]]
name = "timeline"
content = "The abnormal result sat unreviewed for eleven days."

[[revelation_stages]]
name = "root_cause"
content = "A coverage gap during a staff transition left the inbox unmonitored."

[response_style]
length = "moderate"
allow_interruptions = true
use_silence = false
"#
    .to_string()
}

/// The sample vignette, parsed and validated.
pub fn sample_vignette() -> Vignette {
    Vignette::from_toml_str(&sample_vignette_toml()).expect("sample vignette is valid")
}
