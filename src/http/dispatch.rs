//! Tool calls wrapped with lifecycle events.
//!
//! Every call publishes `<op>_started` before the handler runs, then
//! exactly one of `<op>_completed` or `<op>_error`. Rejected input is a
//! completed call; only downstream failures and unknown tools are errors.
//!
//! Once started, a call runs to completion on its own task, so the
//! terminal event is published even if the caller's future is dropped.

use serde_json::{json, Map, Value};

use crate::events::{EventHub, EventType, Operation};
use crate::mcp::tools::{DOWNLOAD_PAPER, LIST_PAPERS, READ_PAPER, SEARCH_PAPERS};
use crate::mcp::{ToolError, ToolRegistry};
use crate::models::ToolOutput;

/// Event payloads of one call
struct Call<'a> {
    op: Operation,
    tool: &'a str,
    /// Data of the started event
    started: Value,
    /// Identifying fields repeated in the completed and error events
    ident: Map<String, Value>,
    /// Completed-event key carrying the output's item count
    count_key: Option<&'static str>,
}

/// Runs tools and reports their progress to the event hub
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tools: ToolRegistry,
    hub: EventHub,
}

fn str_arg(args: &Value, key: &str) -> Value {
    Value::String(
        args.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Dispatcher {
    pub fn new(tools: ToolRegistry, hub: EventHub) -> Self {
        Self { tools, hub }
    }

    pub async fn search(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let ident = object(json!({ "query": str_arg(&args, "query") }));
        let call = Call {
            op: Operation::Search,
            tool: SEARCH_PAPERS,
            started: Value::Object(ident.clone()),
            ident,
            count_key: Some("results_count"),
        };
        self.run(call, args).await
    }

    pub async fn download(&self, args: Value) -> Result<ToolOutput, ToolError> {
        self.by_paper_id(Operation::Download, DOWNLOAD_PAPER, args).await
    }

    pub async fn list(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let call = Call {
            op: Operation::List,
            tool: LIST_PAPERS,
            started: json!({}),
            ident: Map::new(),
            count_key: Some("papers_count"),
        };
        self.run(call, args).await
    }

    pub async fn read(&self, args: Value) -> Result<ToolOutput, ToolError> {
        self.by_paper_id(Operation::Read, READ_PAPER, args).await
    }

    /// Call any registered tool by name. `tool_started` is published before
    /// the name is looked up.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let call = Call {
            op: Operation::Tool,
            tool: name,
            started: json!({ "tool": name, "arguments": args }),
            ident: object(json!({ "tool": name })),
            count_key: None,
        };
        self.run(call, args).await
    }

    async fn by_paper_id(
        &self,
        op: Operation,
        tool: &str,
        args: Value,
    ) -> Result<ToolOutput, ToolError> {
        let ident = object(json!({ "paper_id": str_arg(&args, "paper_id") }));
        let call = Call {
            op,
            tool,
            started: Value::Object(ident.clone()),
            ident,
            count_key: None,
        };
        self.run(call, args).await
    }

    async fn run(&self, call: Call<'_>, args: Value) -> Result<ToolOutput, ToolError> {
        let Call {
            op,
            tool,
            started,
            ident,
            count_key,
        } = call;
        self.hub.publish(EventType::started(op), started);

        let tools = self.tools.clone();
        let hub = self.hub.clone();
        let tool = tool.to_string();
        let mut data = ident.clone();
        let task = tokio::spawn(async move {
            let result = tools.execute(&tool, args).await;
            publish_outcome(&hub, op, ident, count_key, &result);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("{} task failed: {}", op.as_str(), e);
                let err = ToolError::Task(e.to_string());
                data.insert("error".to_string(), err.to_string().into());
                self.hub.publish(EventType::error(op), Value::Object(data));
                Err(err)
            }
        }
    }
}

fn publish_outcome(
    hub: &EventHub,
    op: Operation,
    mut data: Map<String, Value>,
    count_key: Option<&'static str>,
    result: &Result<ToolOutput, ToolError>,
) {
    match result {
        Ok(output) => {
            if let Some(key) = count_key {
                data.insert(key.to_string(), output.item_count().into());
            }
            hub.publish(EventType::completed(op), Value::Object(data));
        }
        Err(e) => {
            data.insert("error".to_string(), e.to_string().into());
            hub.publish(EventType::error(op), Value::Object(data));
        }
    }
}
