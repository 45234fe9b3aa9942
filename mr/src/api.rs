//! Typed wrappers for the mooR REST endpoints
//!
//! Each operation resolves its references, encodes its literals and issues a
//! single [`MoorClient::call`]. Operations the REST surface has no endpoint for
//! (creating, moving and recycling objects, setting properties) are sent as
//! small MOO programs to `POST /eval`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ApiRequest, MoorClient};
use crate::error::{ErrorKind, MoorError};
use crate::literal::{LiteralValue, encode_json, escape_string};
use crate::reference::{extract_obj_curie, resolve};

static RETURN_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\breturn\b").expect("static pattern"));

/// Verb argument spec used by `ensure_verb` when none is given
pub const DEFAULT_VERB_ARGS: [&str; 3] = ["this", "none", "none"];

/// Options for [`MoorClient::ensure_verb`]
#[derive(Debug, Clone)]
pub struct VerbSpec {
    /// MOO expression evaluating to the verb owner
    pub owner_expr: String,
    pub perms: String,
    /// Direct object, preposition, indirect object
    pub args: Vec<String>,
}

impl Default for VerbSpec {
    fn default() -> Self {
        Self {
            owner_expr: "player".to_string(),
            perms: "rxd".to_string(),
            args: DEFAULT_VERB_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Turn a one-line expression into a statement the evaluator accepts
///
/// Single-line input without a `return` gets one prepended, and a missing
/// trailing `;` is added. Multi-line programs are only trimmed.
pub fn normalize_expression(expression: &str) -> Result<String, MoorError> {
    let expr = expression.trim();
    if expr.is_empty() {
        return Err(MoorError::invalid_argument("expression must not be empty"));
    }
    if expr.contains('\n') {
        return Ok(expr.to_string());
    }
    let mut expr = if RETURN_WORD.is_match(expr) {
        expr.to_string()
    } else {
        format!("return {}", expr)
    };
    if !expr.ends_with(';') {
        expr.push(';');
    }
    Ok(expr)
}

/// Object reference as a URL path segment
fn object_segment(curie: &str) -> Result<&str, MoorError> {
    let curie = curie.trim();
    if curie.is_empty() {
        return Err(MoorError::invalid_reference("object identifier must not be empty"));
    }
    Ok(curie)
}

fn object_expr(curie: &str) -> Result<String, MoorError> {
    Ok(resolve(curie)?.render())
}

fn create_object_program(parent: &str, owner: &str, properties: Option<&Map<String, Value>>) -> Result<String, MoorError> {
    let mut lines = vec![format!("obj = create({}, {});", object_expr(parent)?, object_expr(owner)?)];
    for (name, value) in properties.into_iter().flatten() {
        lines.push(format!("obj.({}) = {};", escape_string(name), encode_json(value)?));
    }
    lines.push("return obj;".to_string());
    Ok(lines.join("\n"))
}

fn set_property_program(object: &str, name: &str, value: &Value) -> Result<String, MoorError> {
    let target = object_expr(object)?;
    let name = escape_string(name);
    Ok(format!(
        "{target}.({name}) = {};\nreturn {target}.({name});",
        encode_json(value)?
    ))
}

fn add_verb_program(object: &str, name: &str, spec: &VerbSpec) -> Result<String, MoorError> {
    let [dobj, prep, iobj] = spec.args.as_slice() else {
        return Err(MoorError::invalid_argument(format!(
            "verb args must have exactly 3 entries, got {}",
            spec.args.len()
        )));
    };
    if spec.owner_expr.trim().is_empty() {
        return Err(MoorError::invalid_argument("owner expression must not be empty"));
    }
    Ok(format!(
        "try\n  add_verb({}, {{{}, {}, {}}}, {{{}, {}, {}}});\nexcept error (ANY)\n  0;\nendtry;\nreturn 1;",
        object_expr(object)?,
        spec.owner_expr.trim(),
        escape_string(&spec.perms),
        escape_string(name),
        escape_string(dobj),
        escape_string(prep),
        escape_string(iobj),
    ))
}

fn sysobjs_program(names: Option<&[String]>) -> Result<String, MoorError> {
    let (names_stmt, include_missing) = match names {
        Some(names) if !names.is_empty() => {
            let list = LiteralValue::List(names.iter().map(|n| LiteralValue::from(n.as_str())).collect());
            (format!("names = {};", list.encode()?), true)
        }
        _ => ("names = properties(#0);".to_string(), false),
    };
    let lines = [
        names_stmt.as_str(),
        "out = {};",
        "for n in (names)",
        "  try",
        "    v = #0.(n);",
        "  except error (ANY)",
        "    v = 0;",
        "  endtry;",
        "  if (typeof(v) == OBJ)",
        "    out = {@out, {n, v}};",
        if include_missing {
            "  elseif (1)"
        } else {
            "  elseif (0)"
        },
        "    out = {@out, {n, 0}};",
        "  endif;",
        "endfor;",
        "return out;",
    ];
    Ok(lines.join("\n"))
}

/// Fold the `{{name, value}, ...}` reply of the sysobj program into `{name: curie|null}`
fn collect_sysobjs(payload: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    for item in payload.as_array().into_iter().flatten() {
        if let Some([Value::String(name), value]) = item.as_array().map(Vec::as_slice) {
            let curie = extract_obj_curie(value).map_or(Value::Null, |c| Value::String(c.to_string()));
            out.insert(name.clone(), curie);
        }
    }
    out
}

impl MoorClient {
    async fn eval_program(&self, context: &'static str, program: String) -> Result<Value, MoorError> {
        debug!(%context, lines = program.lines().count(), "eval_program: called");
        self.call(ApiRequest::post(context, &["eval"]).text(program)).await
    }

    /// Evaluate a MOO expression or program
    pub async fn eval_expr(&self, expression: &str) -> Result<Value, MoorError> {
        debug!("eval_expr: called");
        let program = normalize_expression(expression)?;
        self.eval_program("eval_expr", program).await
    }

    /// Create a child of `parent` owned by `owner`, optionally setting properties
    pub async fn create_object(
        &self,
        parent: &str,
        owner: &str,
        properties: Option<&Map<String, Value>>,
    ) -> Result<Value, MoorError> {
        debug!(%parent, %owner, "create_object: called");
        let program = create_object_program(parent, owner, properties)?;
        self.eval_program("create_object", program).await
    }

    pub async fn set_property(&self, object: &str, name: &str, value: &Value) -> Result<Value, MoorError> {
        debug!(%object, %name, "set_property: called");
        let program = set_property_program(object, name, value)?;
        self.eval_program("set_property", program).await
    }

    pub async fn get_property(&self, object: &str, name: &str) -> Result<Value, MoorError> {
        debug!(%object, %name, "get_property: called");
        self.call(ApiRequest::get("get_property", &["properties", object_segment(object)?, name]))
            .await
    }

    pub async fn list_properties(&self, object: &str, inherited: bool) -> Result<Value, MoorError> {
        debug!(%object, %inherited, "list_properties: called");
        self.call(ApiRequest::get("list_properties", &["properties", object_segment(object)?]).query("inherited", inherited))
            .await
    }

    /// Fetch a verb; `null` when it does not exist
    pub async fn get_verb(&self, object: &str, name: &str) -> Result<Value, MoorError> {
        debug!(%object, %name, "get_verb: called");
        self.call(ApiRequest::get("get_verb", &["verbs", object_segment(object)?, name]).absent_on(404))
            .await
    }

    pub async fn list_verbs(&self, object: &str, inherited: bool) -> Result<Value, MoorError> {
        debug!(%object, %inherited, "list_verbs: called");
        self.call(ApiRequest::get("list_verbs", &["verbs", object_segment(object)?]).query("inherited", inherited))
            .await
    }

    /// Add the verb unless it already exists
    pub async fn ensure_verb(&self, object: &str, name: &str, spec: &VerbSpec) -> Result<(), MoorError> {
        debug!(%object, %name, ?spec, "ensure_verb: called");
        let program = add_verb_program(object, name, spec)?;
        match self.get_verb(object, name).await {
            Ok(Value::Object(_)) => {
                debug!(%name, "ensure_verb: verb already present");
                return Ok(());
            }
            Ok(_) => {}
            // Some servers answer a missing verb with 500
            Err(e) if e.kind == ErrorKind::RequestFailed && matches!(e.status_code, Some(404 | 500)) => {}
            Err(e) => return Err(e),
        }
        self.eval_program("ensure_verb", program).await?;
        Ok(())
    }

    /// Replace a verb's source code
    pub async fn program_verb(&self, object: &str, name: &str, code: &str) -> Result<Value, MoorError> {
        debug!(%object, %name, code_len = code.len(), "program_verb: called");
        self.call(ApiRequest::post("program_verb", &["verbs", object_segment(object)?, name]).text(code))
            .await
    }

    pub async fn invoke_verb(&self, object: &str, name: &str, args: &[Value]) -> Result<Value, MoorError> {
        debug!(%object, %name, argc = args.len(), "invoke_verb: called");
        self.call(
            ApiRequest::post("invoke_verb", &["verbs", object_segment(object)?, name, "invoke"])
                .json(Value::Array(args.to_vec())),
        )
        .await
    }

    /// Resolve any reference to the server's canonical CURIE; `None` when nothing matches
    pub async fn resolve_object(&self, object: &str) -> Result<Option<String>, MoorError> {
        debug!(%object, "resolve_object: called");
        let payload = self
            .call(ApiRequest::get("resolve_object", &["objects", object_segment(object)?]).absent_on(404))
            .await?;
        let Value::Object(map) = payload else {
            return Ok(None);
        };
        Ok(["obj", "oid", "object"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string))
    }

    pub async fn get_history(&self, since_seconds: Option<u64>, limit: Option<u64>) -> Result<Value, MoorError> {
        debug!(?since_seconds, ?limit, "get_history: called");
        let mut request = ApiRequest::get("get_history", &["api", "history"]);
        if let Some(since) = since_seconds {
            request = request.query("since_seconds", since);
        }
        if let Some(limit) = limit {
            request = request.query("limit", limit);
        }
        self.call(request).await
    }

    pub async fn list_presentations(&self) -> Result<Value, MoorError> {
        debug!("list_presentations: called");
        self.call(ApiRequest::get("list_presentations", &["api", "presentations"]))
            .await
    }

    pub async fn dismiss_presentation(&self, id: &str) -> Result<Value, MoorError> {
        debug!(%id, "dismiss_presentation: called");
        if id.trim().is_empty() {
            return Err(MoorError::invalid_argument("presentation id must not be empty"));
        }
        self.call(ApiRequest::delete("dismiss_presentation", &["api", "presentations", id.trim()]).allow_empty())
            .await
    }

    pub async fn move_object(&self, object: &str, destination: &str) -> Result<Value, MoorError> {
        debug!(%object, %destination, "move_object: called");
        let target = object_expr(object)?;
        let program = format!("move({}, {});\nreturn {};", target, object_expr(destination)?, target);
        self.eval_program("move_object", program).await
    }

    pub async fn recycle_object(&self, object: &str) -> Result<Value, MoorError> {
        debug!(%object, "recycle_object: called");
        let program = format!("recycle({});\nreturn 1;", object_expr(object)?);
        self.eval_program("recycle_object", program).await
    }

    /// Map system object names to CURIEs in one round trip
    ///
    /// With `names`, every requested name is present (`null` when it is not an
    /// object); without, only the object-valued properties of `#0` are listed.
    pub async fn list_sysobjs(&self, names: Option<&[String]>) -> Result<Map<String, Value>, MoorError> {
        debug!(?names, "list_sysobjs: called");
        let program = sysobjs_program(names)?;
        let payload = self.eval_program("list_sysobjs", program).await?;
        Ok(collect_sysobjs(&payload))
    }
}
