use crate::definition::{Provider, WorkflowDefinition};

const START_URL: &str = "https://www.google.com";

/// The example workflows shipped with wayfarer.
pub fn example_workflows() -> Vec<WorkflowDefinition> {
  vec![
    WorkflowDefinition::new("W3 Challenge", Provider::Anthropic)
      .with_field("workflow_name", "Coding Challenge")
      .with_field("start_url", START_URL)
      .with_prompt(
        "I want you to complete a coding challenge for me. This can be done on any website; \
         and I want you to do it in order to explain to me what was done, to help me learn to code",
      ),
    WorkflowDefinition::new("Reddit AI Summariser", Provider::Anthropic)
      .with_field("workflow_name", "Reddit AI Summariser")
      .with_field("start_url", START_URL)
      .with_prompt(
        "I want you to go to reddit and find me a well known AI based subreddit. I then want you \
         to find the top recent posts, and summarise the top 3 posts for me.",
      ),
    WorkflowDefinition::new("World News Summariser", Provider::Anthropic)
      .with_field("workflow_name", "World New Summariser")
      .with_field("start_url", START_URL)
      .with_prompt(
        "I want to get an overall view of recent world events. In order to do this, can you go \
         to a news website and choose a headline. Then, can you look at other news websites and \
         summarise the same headline from different perspectives.",
      ),
  ]
}
