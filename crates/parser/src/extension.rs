//! `x-kusk` extraction

use kusk_gen_common::{ApiDescription, ExtensionBlock, PathExtension};
use tracing::debug;

/// Collect the `x-kusk` blocks of every scope of a parsed document
///
/// A `null` block is treated as absent. Paths without any block are left
/// out of the result.
pub fn get_options(api: &ApiDescription) -> ExtensionBlock {
    let mut block = ExtensionBlock {
        global: api.extension.clone().filter(|v| !v.is_null()),
        paths: Default::default(),
    };

    for (path, item) in &api.paths {
        let mut path_extension = PathExtension {
            options: item.extension.clone().filter(|v| !v.is_null()),
            operations: Default::default(),
        };

        for (method, operation) in &item.operations {
            if let Some(ext) = operation.extension.as_ref().filter(|v| !v.is_null()) {
                path_extension.operations.insert(method.clone(), ext.clone());
            }
        }

        if path_extension.options.is_some() || !path_extension.operations.is_empty() {
            debug!(%path, operations = path_extension.operations.len(), "found x-kusk blocks");
            block.paths.insert(path.clone(), path_extension);
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use kusk_gen_common::{Operation, PathItem};
    use serde_json::json;

    #[test]
    fn test_get_options_mirrors_hierarchy() {
        let mut api = ApiDescription {
            extension: Some(json!({"service": {"name": "petstore"}})),
            ..Default::default()
        };
        let mut item = PathItem {
            extension: Some(json!({"disabled": true})),
            ..Default::default()
        };
        item.operations.insert(
            "GET".to_string(),
            Operation {
                extension: Some(json!({"disabled": false})),
                ..Default::default()
            },
        );
        item.operations.insert("POST".to_string(), Operation::default());
        api.paths.insert("/".to_string(), item);
        api.paths.insert("/plain".to_string(), PathItem::default());

        let block = get_options(&api);
        assert_eq!(block.global, Some(json!({"service": {"name": "petstore"}})));
        assert_eq!(block.paths.len(), 1);
        let root = &block.paths["/"];
        assert_eq!(root.options, Some(json!({"disabled": true})));
        assert_eq!(root.operations.keys().collect::<Vec<_>>(), vec!["GET"]);
    }

    #[test]
    fn test_null_blocks_are_absent() {
        let api = ApiDescription {
            extension: Some(serde_json::Value::Null),
            ..Default::default()
        };
        assert!(get_options(&api).is_empty());
    }
}
