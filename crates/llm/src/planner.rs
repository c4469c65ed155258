use tracing::info;

use crate::client::ResilientCompletionClient;
use crate::errors::CompletionError;

/// Builds the prompt that asks the completion service for a YAML plan.
pub fn build_plan_prompt(instruction: &str) -> String {
    format!(
        "Convert the following instruction into a YAML automation plan.\n\
         Reply with YAML only: a mapping with a `steps` list.\n\
         Supported actions: goto, click, fill, wait.\n\
         Each step is a mapping with an `action` and the fields that action needs:\n\
         - goto: `url` of the page to open\n\
         - click: `target` CSS selector of the element to click\n\
         - fill: `target` CSS selector and `value` text to enter\n\
         - wait: `seconds` to pause\n\
         Instruction: \"{}\"\n",
        instruction.trim()
    )
}

/// Turns a natural-language instruction into raw plan text.
///
/// The text is returned unparsed; deserializing it is the caller's job.
pub struct PlanGenerator {
    client: ResilientCompletionClient,
}

impl PlanGenerator {
    pub fn new(client: ResilientCompletionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ResilientCompletionClient {
        &self.client
    }

    pub async fn generate(&self, instruction: &str) -> Result<String, CompletionError> {
        info!(target: "planner", instruction, "Generating plan");
        let prompt = build_plan_prompt(instruction);
        let text = self.client.complete(&prompt).await?;
        info!(target: "planner", bytes = text.len(), "Plan text received");
        Ok(text)
    }
}
