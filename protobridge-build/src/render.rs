use crate::FileSpec;

/// Errors raised by a [Renderer]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template failed to execute
    #[error("template error: {0}")]
    Template(String),
    /// Data could not be encoded as JSON
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns template data into file content.
///
/// Renderers only substitute text, names and import paths in `data` are final.
pub trait Renderer {
    /// Content of the file described by `spec`
    fn render(&mut self, spec: &FileSpec, data: &serde_json::Value) -> Result<String, RenderError>;
}

/// Emits the template data itself as pretty JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(
        &mut self,
        _spec: &FileSpec,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let mut out = serde_json::to_string_pretty(data)?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileType;
    use protobridge_core::Target;

    #[test]
    fn json_renderer_test() {
        let spec = FileSpec {
            logical_name: "factory".to_owned(),
            filename: "factory.ts".to_owned(),
            file_type: FileType::Factory,
            target: Target::Script,
            required: true,
            hints: Default::default(),
        };
        let data = serde_json::json!({"class_name": "ShopV1Factory"});
        let out = JsonRenderer.render(&spec, &data).unwrap();
        assert_eq!(out, "{\n  \"class_name\": \"ShopV1Factory\"\n}\n");
    }
}
