//! protoc plugin generating WASM back-end bindings and TypeScript front-end clients
//!
//! Reads a `CodeGeneratorRequest` from stdin and answers with a `CodeGeneratorResponse` on stdout.
//! The plugin parameter is a comma-separated list of `key=value` configuration entries,
//! `config=<path>` loads a TOML file first.
//!
//! Logs go to stderr, `PROTOBRIDGE_LOG` overrides the level.
//!
use std::io::{Read, Write};

use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use simplelog::{LevelFilter, WriteLogger};

use protobridge_build::{Generator, JsonRenderer};
use protobridge_core::{Config, SchemaGraph};

const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_ENV: &str = "PROTOBRIDGE_LOG";

fn log_level() -> LevelFilter {
    let default = {
        #[cfg(debug_assertions)]
        {
            LevelFilter::Debug
        }
        #[cfg(not(debug_assertions))]
        {
            LevelFilter::Info
        }
    };
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(default)
}

/// Packages of the requested files, first appearance first
fn requested_packages<'g>(graph: &'g SchemaGraph, request: &CodeGeneratorRequest) -> Vec<&'g str> {
    let mut packages: Vec<&str> = Vec::new();
    for file_name in &request.file_to_generate {
        let Some(file) = graph.file_index(file_name).and_then(|index| graph.file(index)) else {
            log::warn!("Requested file {} is not part of the request", file_name);
            continue;
        };
        if !packages.contains(&file.package()) {
            packages.push(file.package());
        }
    }
    packages
}

fn generate(request: CodeGeneratorRequest) -> Result<Vec<File>, String> {
    let config = Config::from_parameter(request.parameter()).map_err(|e| e.to_string())?;
    let graph = SchemaGraph::new(request.proto_file.clone());
    let packages = requested_packages(&graph, &request);
    log::debug!("Generating packages {:?}", packages);

    let generator = Generator::new(&graph, &config).map_err(|e| e.to_string())?;
    let mut sets = generator.generate_all(packages).map_err(|e| e.to_string())?;

    let mut files = Vec::new();
    for set in sets.iter_mut() {
        set.render_with(&mut JsonRenderer).map_err(|e| e.to_string())?;
        files.extend(set.outputs().into_iter().map(|(path, content)| File {
            name: Some(path.to_owned()),
            content: Some(content.to_owned()),
            ..Default::default()
        }));
    }
    Ok(files)
}

/// Response to an encoded request; failures are reported in `error`, never as files
fn respond(input: &[u8]) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };
    match CodeGeneratorRequest::decode(input) {
        Ok(request) => match generate(request) {
            Ok(files) => {
                log::info!("Emitting {} files", files.len());
                response.file = files;
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                response.error = Some(e);
            }
        },
        Err(e) => {
            log::error!("Cannot decode request: {}", e);
            response.error = Some(format!("cannot decode CodeGeneratorRequest: {}", e));
        }
    }
    response
}

fn main() -> Result<(), std::io::Error> {
    if let Err(e) = WriteLogger::init(log_level(), Default::default(), std::io::stderr()) {
        eprintln!("Cannot initialise logger: {}", e);
    }
    log::info!("Starting {} v{}", PACKAGE_NAME, PACKAGE_VERSION);

    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;
    let response = respond(&input);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.encode_to_vec())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protobridge_core::fixtures::*;

    fn request(
        files: &[&str],
        parameter: &str,
        proto_file: Vec<prost_types::FileDescriptorProto>,
    ) -> Vec<u8> {
        CodeGeneratorRequest {
            file_to_generate: files.iter().map(|file| (*file).to_owned()).collect(),
            parameter: Some(parameter.to_owned()),
            proto_file,
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn shop_response_test() {
        let input = request(&["shop/v1/cart.proto"], "methods_exclude=InternalDebug", shop_files());
        let response = respond(&input);
        assert_eq!(response.error, None);
        assert_eq!(response.supported_features, Some(Feature::Proto3Optional as u64));
        let names: Vec<&str> = response.file.iter().map(|file| file.name()).collect();
        assert_eq!(
            names,
            [
                "backend/shop/v1/shop_v1_wasm.rs",
                "script/shop/v1/cart_service_client.ts",
                "script/shop/v1/cart_interfaces.ts",
                "script/shop/v1/factory.ts",
                "script/shop/v1/schemas.ts",
                "script/shop/v1/index.ts",
            ]
        );
        let client: serde_json::Value = serde_json::from_str(response.file[1].content()).unwrap();
        assert_eq!(client["file"]["service"]["methods"][0]["name"], "AddItem");
    }

    #[test]
    fn requested_packages_test() {
        let graph = SchemaGraph::new(vec![
            file("a/b/one.proto", "a.b").build(),
            file("x/y.proto", "x").build(),
            file("a/b/two.proto", "a.b").build(),
        ]);
        let request = CodeGeneratorRequest {
            file_to_generate: vec![
                "a/b/one.proto".to_owned(),
                "missing.proto".to_owned(),
                "a/b/two.proto".to_owned(),
                "x/y.proto".to_owned(),
            ],
            ..Default::default()
        };
        assert_eq!(requested_packages(&graph, &request), ["a.b", "x"]);
    }

    #[test]
    fn unresolved_type_response_test() {
        let files = vec![
            file("good.proto", "good").message(message("Fine", vec![])).build(),
            file("bad.proto", "bad")
                .message(message("Broken", vec![message_field("gone", 1, ".bad.Gone")]))
                .build(),
        ];
        let response = respond(&request(&["good.proto", "bad.proto"], "", files));
        assert!(response.file.is_empty());
        let error = response.error.unwrap();
        assert!(error.contains("bad.Broken.gone"), "{}", error);
        assert!(error.contains(".bad.Gone"), "{}", error);
    }

    #[test]
    fn bad_input_response_test() {
        let response = respond(&request(&[], "frobnicate=1", Vec::new()));
        assert!(response.file.is_empty());
        assert!(response.error.unwrap().contains("frobnicate"));

        let response = respond(&[0xff]);
        assert!(response.file.is_empty());
        assert!(response.error.unwrap().starts_with("cannot decode CodeGeneratorRequest"));
    }
}
