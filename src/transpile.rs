use tracing::debug;

use crate::expression::parse_expr;

/// Rewrites a Python-flavoured binding expression into its JavaScript form:
/// `str(x)` → `String(x)`, `len(x)` → `(x).length`, `a if c else b` →
/// `(c ? a : b)`, `x in y` → `(y).includes(x)`, `and`/`or`/`not` →
/// `&&`/`||`/`!`.
///
/// Best effort: input that does not parse comes back unchanged.
pub fn transpile(expr: &str) -> String {
    match parse_expr(expr.trim()) {
        Ok(ast) => ast.to_string(),
        Err(err) => {
            debug!(expr, error = %err, "leaving untranspilable expression as-is");
            expr.to_string()
        }
    }
}
