//! Turns a legacy transform mapping into a Spark SQL projection list.

use crate::{
    dataflow_functions::{DataflowFunction, render_call},
    parser::{self, Expression},
    statement::split_statements,
};

/// Translation configuration: the table aliases used by the source mapping.
///
/// `output_alias` is carried for parity with legacy call sites; it does not
/// influence the produced text.
#[derive(Debug, Clone)]
pub struct Translator {
    pub input_alias: String,
    pub output_alias: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            input_alias: "in0".to_string(),
            output_alias: "out".to_string(),
        }
    }
}

impl Translator {
    pub fn new(input_alias: impl Into<String>, output_alias: impl Into<String>) -> Self {
        Self {
            input_alias: input_alias.into(),
            output_alias: output_alias.into(),
        }
    }

    /// Translates a whole mapping: one `<expr> AS <field>` fragment per
    /// statement, joined with commas, input order preserved. Statements
    /// whose expressions fail structural parsing are skipped with a
    /// warning; the batch always completes and returns whatever translated.
    pub fn convert(&self, source: &str) -> String {
        let mut fragments = Vec::new();
        for statement in split_statements(source) {
            match parser::parse(&statement.expression, &self.input_alias) {
                Ok(tree) => fragments.push(format!(
                    "{} AS {}",
                    self.render_expression(&tree),
                    statement.field
                )),
                Err(e) => log::warn!("skipping statement for field {}: {e}", statement.field),
            }
        }
        fragments.join(", ")
    }

    /// Renders one argument tree. Always produces text: unknown functions
    /// and arity mismatches degrade to a commented best-effort call rather
    /// than failing the statement.
    fn render_expression(&self, expression: &Expression) -> String {
        match expression {
            Expression::Literal(text) => text.clone(),
            Expression::Column(name) => name.clone(),
            Expression::FunctionCall { name, args } => {
                // Inner calls resolve before the outer template runs
                let args: Vec<String> = args.iter().map(|a| self.render_expression(a)).collect();
                match DataflowFunction::from_name(name) {
                    Some(function) => apply(function, name, args),
                    None => format!(
                        "/* Unknown function: {name} */ {}",
                        render_call(name, &args)
                    ),
                }
            }
        }
    }
}

/// Pads optional trailing arguments from the entry's defaults table, then
/// runs the template. Counts outside what the signature allows fall back to
/// a commented reassembly of the translated arguments.
fn apply(function: DataflowFunction, name: &str, mut args: Vec<String>) -> String {
    let signature = function.signature();
    if args.len() < signature.required {
        return format!(
            "/* {name} expects at least {} arguments, got {} */ {}",
            signature.required,
            args.len(),
            render_call(name, &args)
        );
    }
    if !signature.variadic && args.len() > signature.full() {
        return format!(
            "/* {name} expects at most {} arguments, got {} */ {}",
            signature.full(),
            args.len(),
            render_call(name, &args)
        );
    }
    while args.len() < signature.full() {
        args.push(signature.defaults[args.len() - signature.required].to_string());
    }
    function.render(&args)
}
