//! Verb tools

use async_trait::async_trait;
use moorrest::VerbSpec;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, ToolResult, args};

/// Schema fragments shared by the verb-creating tools
fn verb_spec_properties() -> Value {
    json!({
        "owner_expr": {
            "type": "string",
            "description": "MOO expression for the verb owner (default: player)",
            "default": "player"
        },
        "perms": {
            "type": "string",
            "description": "Verb permissions (default: rxd)",
            "default": "rxd"
        },
        "args": {
            "type": "array",
            "items": { "type": "string" },
            "minItems": 3,
            "maxItems": 3,
            "description": "Argument spec [dobj, prep, iobj] (default: [\"this\", \"none\", \"none\"])"
        }
    })
}

fn verb_spec(input: &Value) -> Result<VerbSpec, ToolError> {
    let mut spec = VerbSpec::default();
    if let Some(owner) = args::optional_str(input, "owner_expr")? {
        spec.owner_expr = owner.to_string();
    }
    if let Some(perms) = args::optional_str(input, "perms")? {
        spec.perms = perms.to_string();
    }
    if let Some(verb_args) = args::optional_string_list(input, "args")? {
        spec.args = verb_args;
    }
    Ok(spec)
}

/// Read a verb's metadata and code
pub struct GetVerbTool;

#[async_trait]
impl Tool for GetVerbTool {
    fn name(&self) -> &'static str {
        "moor_get_verb"
    }

    fn description(&self) -> &'static str {
        "Fetch a verb's definition and source code. Returns null when the verb does not exist."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "verb_name": { "type": "string", "description": "Verb name" }
            },
            "required": ["object", "verb_name"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "GetVerbTool::execute: called");
        ToolResult::from(get(&input, ctx).await)
    }
}

async fn get(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let verb_name = args::require_str(input, "verb_name")?;
    Ok(ctx.client.get_verb(object, verb_name).await?)
}

/// List an object's verbs
pub struct ListVerbsTool;

#[async_trait]
impl Tool for ListVerbsTool {
    fn name(&self) -> &'static str {
        "moor_list_verbs"
    }

    fn description(&self) -> &'static str {
        "List the verbs defined on an object, optionally including inherited ones."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "inherited": {
                    "type": "boolean",
                    "description": "Include inherited verbs (default: false)",
                    "default": false
                }
            },
            "required": ["object"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ListVerbsTool::execute: called");
        ToolResult::from(list(&input, ctx).await)
    }
}

async fn list(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let inherited = args::optional_bool(input, "inherited", false)?;
    Ok(ctx.client.list_verbs(object, inherited).await?)
}

/// Add a verb if it is missing
pub struct EnsureVerbTool;

#[async_trait]
impl Tool for EnsureVerbTool {
    fn name(&self) -> &'static str {
        "moor_ensure_verb"
    }

    fn description(&self) -> &'static str {
        "Make sure a verb exists on an object, adding an empty one if it does not. Safe to call repeatedly."
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "object": { "type": "string", "description": "Object reference" },
            "verb_name": { "type": "string", "description": "Verb name" }
        });
        merge(&mut properties, verb_spec_properties());
        json!({
            "type": "object",
            "properties": properties,
            "required": ["object", "verb_name"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "EnsureVerbTool::execute: called");
        ToolResult::from(ensure(&input, ctx).await)
    }
}

async fn ensure(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let verb_name = args::require_str(input, "verb_name")?;
    let spec = verb_spec(input)?;
    ctx.client.ensure_verb(object, verb_name, &spec).await?;
    Ok(json!({"ok": true}))
}

/// Set a verb's source, creating the verb first when needed
pub struct ProgramVerbTool;

#[async_trait]
impl Tool for ProgramVerbTool {
    fn name(&self) -> &'static str {
        "moor_program_verb"
    }

    fn description(&self) -> &'static str {
        "Replace a verb's source code, adding the verb first if it does not exist."
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "object": { "type": "string", "description": "Object reference" },
            "verb_name": { "type": "string", "description": "Verb name" },
            "code": { "type": "string", "description": "Complete MOO source for the verb" }
        });
        merge(&mut properties, verb_spec_properties());
        json!({
            "type": "object",
            "properties": properties,
            "required": ["object", "verb_name", "code"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!("ProgramVerbTool::execute: called");
        ToolResult::from(program(&input, ctx).await)
    }
}

async fn program(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let verb_name = args::require_str(input, "verb_name")?;
    let code = args::require_text(input, "code")?;
    let spec = verb_spec(input)?;
    ctx.client.ensure_verb(object, verb_name, &spec).await?;
    Ok(ctx.client.program_verb(object, verb_name, code).await?)
}

/// Call a verb with arguments
pub struct InvokeVerbTool;

#[async_trait]
impl Tool for InvokeVerbTool {
    fn name(&self) -> &'static str {
        "moor_invoke_verb"
    }

    fn description(&self) -> &'static str {
        "Invoke a verb on an object with a list of JSON arguments and return its result."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object": { "type": "string", "description": "Object reference" },
                "verb_name": { "type": "string", "description": "Verb name" },
                "args": {
                    "type": "array",
                    "description": "Arguments passed to the verb (default: [])"
                }
            },
            "required": ["object", "verb_name"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "InvokeVerbTool::execute: called");
        ToolResult::from(invoke(&input, ctx).await)
    }
}

async fn invoke(input: &Value, ctx: &ToolContext) -> Result<Value, ToolError> {
    let object = args::require_str(input, "object")?;
    let verb_name = args::require_str(input, "verb_name")?;
    let verb_args = args::optional_array(input, "args")?;
    Ok(ctx.client.invoke_verb(object, verb_name, verb_args).await?)
}

fn merge(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}
