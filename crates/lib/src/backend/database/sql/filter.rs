//! Compile [`Filter`]s to SQLite `WHERE` clauses over JSON documents.
//!
//! Documents are stored as JSON text in the `doc` column and read with the
//! JSON1 functions (`json_extract`, `json_type`, `json_each`). Field paths
//! have already been validated, so they are embedded as literals; values are
//! always bound.

use serde_json::{Number, Value};

use crate::{
    Result,
    backend::{Filter, errors::BackendError},
    constants::ID_FIELD,
};

/// A bound parameter of a compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlArg {
    Text(String),
    Integer(i64),
    Real(f64),
}

/// A compiled `WHERE` clause and its parameters, in order.
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    pub(crate) sql: String,
    pub(crate) args: Vec<SqlArg>,
}

/// Compile `filter` against the `doc` column of the collection table.
pub(crate) fn compile(filter: &Filter) -> Result<WhereClause> {
    let mut compiler = Compiler::default();
    let sql = compiler.compile(filter, "doc", true)?;
    Ok(WhereClause {
        sql,
        args: compiler.args,
    })
}

#[derive(Default)]
struct Compiler {
    args: Vec<SqlArg>,
    aliases: usize,
}

impl Compiler {
    /// `source` is the SQL expression holding the JSON being tested; `top`
    /// is true for the document itself, where `id` has its own column.
    fn compile(&mut self, filter: &Filter, source: &str, top: bool) -> Result<String> {
        match filter {
            Filter::All => Ok("1".to_string()),
            Filter::Eq { path, value } if top && path == ID_FIELD => match value {
                Value::String(id) => {
                    self.args.push(SqlArg::Text(id.clone()));
                    Ok("id = ?".to_string())
                }
                // Stored ids are always strings.
                _ => Ok("0".to_string()),
            },
            Filter::Eq { path, value } => {
                let path = json_path(path);
                self.compare(
                    &format!("json_extract({source}, '{path}')"),
                    &format!("json_type({source}, '{path}')"),
                    value,
                )
            }
            Filter::Contains { path, value } => {
                let path = json_path(path);
                let alias = self.alias();
                let test =
                    self.compare(&format!("{alias}.value"), &format!("{alias}.type"), value)?;
                Ok(format!(
                    "(json_type({source}, '{path}') = 'array' AND EXISTS (SELECT 1 FROM json_each({source}, '{path}') AS {alias} WHERE {test}))"
                ))
            }
            Filter::ElemMatch { path, filter } => {
                let path = json_path(path);
                let alias = self.alias();
                let inner = self.compile(filter, &format!("{alias}.value"), false)?;
                Ok(format!(
                    "(json_type({source}, '{path}') = 'array' AND EXISTS (SELECT 1 FROM json_each({source}, '{path}') AS {alias} WHERE {alias}.type = 'object' AND {inner}))"
                ))
            }
            Filter::And(filters) if filters.is_empty() => Ok("1".to_string()),
            Filter::And(filters) => {
                let parts = filters
                    .iter()
                    .map(|f| self.compile(f, source, top).map(|sql| format!("({sql})")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join(" AND "))
            }
        }
    }

    /// Equality of a JSON value, given expressions for its SQL value and its
    /// JSON type.
    fn compare(&mut self, value_expr: &str, type_expr: &str, value: &Value) -> Result<String> {
        match value {
            // json_type is NULL for a missing path and 'null' for an explicit null.
            Value::Null => Ok(format!("({type_expr} IS NULL OR {type_expr} = 'null')")),
            Value::Bool(true) => Ok(format!("{type_expr} = 'true'")),
            Value::Bool(false) => Ok(format!("{type_expr} = 'false'")),
            Value::Number(n) => {
                self.args.push(number_arg(n)?);
                Ok(format!("{value_expr} = ?"))
            }
            Value::String(s) => {
                self.args.push(SqlArg::Text(s.clone()));
                Ok(format!("({type_expr} = 'text' AND {value_expr} = ?)"))
            }
            Value::Array(_) | Value::Object(_) => Err(BackendError::UnsupportedFilter {
                reason: "equality against arrays or objects is not supported".to_string(),
            }
            .into()),
        }
    }

    fn alias(&mut self) -> String {
        self.aliases += 1;
        format!("j{}", self.aliases)
    }
}

fn number_arg(n: &Number) -> Result<SqlArg> {
    if let Some(i) = n.as_i64() {
        Ok(SqlArg::Integer(i))
    } else if let Some(f) = n.as_f64() {
        Ok(SqlArg::Real(f))
    } else {
        Err(BackendError::UnsupportedFilter {
            reason: format!("number {n} does not fit a SQLite value"),
        }
        .into())
    }
}

fn json_path(path: &str) -> String {
    format!("$.{path}")
}
