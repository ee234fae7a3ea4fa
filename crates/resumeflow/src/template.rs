use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// Render a tera template held in memory against any serializable context.
pub fn render<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}
