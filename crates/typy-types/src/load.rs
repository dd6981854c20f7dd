//! JSON handoff from an external front-end.
//!
//! The front-end serializes a parsed [`Module`] with serde; the runtime
//! decodes it here and rejects trees that no evaluator could run.

use crate::ast::{ClassDef, FunctionDef, Module};
use crate::error::{LoadError, LoadResult};
use std::collections::HashSet;

/// Decode a module tree from JSON and validate its shape.
pub fn load_module_json(json: &str) -> LoadResult<Module> {
    let module: Module = serde_json::from_str(json)?;
    validate_module(&module)?;
    Ok(module)
}

/// Encode a module tree as JSON (the inverse of [`load_module_json`]).
pub fn module_to_json(module: &Module) -> LoadResult<String> {
    Ok(serde_json::to_string(module)?)
}

/// Structural checks that the type checker would normally guarantee.
pub fn validate_module(module: &Module) -> LoadResult<()> {
    for class in module.classes() {
        validate_class(class)?;
    }
    for func in module.functions() {
        validate_function(func, None)?;
    }
    Ok(())
}

fn validate_class(class: &ClassDef) -> LoadResult<()> {
    let class_name = &class.name.name;
    if class_name.is_empty() {
        return Err(LoadError::Invalid("class with empty name".into()));
    }

    let mut seen = HashSet::new();
    for field in &class.fields {
        if !seen.insert(field.name.name.as_str()) {
            return Err(LoadError::Invalid(format!(
                "duplicate field '{}' in class '{class_name}'",
                field.name.name
            )));
        }
    }

    let mut methods = HashSet::new();
    for method in &class.methods {
        if !methods.insert(method.name.name.as_str()) {
            return Err(LoadError::Invalid(format!(
                "duplicate method '{}' in class '{class_name}'",
                method.name.name
            )));
        }
        if method.params.is_empty() {
            return Err(LoadError::Invalid(format!(
                "method '{class_name}.{}' must take 'self' as its first parameter",
                method.name.name
            )));
        }
        validate_function(method, Some(class_name))?;
    }
    Ok(())
}

fn validate_function(func: &FunctionDef, owner: Option<&str>) -> LoadResult<()> {
    let mut seen = HashSet::new();
    for param in &func.params {
        if !seen.insert(param.name.name.as_str()) {
            let qualified = match owner {
                Some(class) => format!("{class}.{}", func.name.name),
                None => func.name.name.clone(),
            };
            return Err(LoadError::Invalid(format!(
                "duplicate parameter '{}' in '{qualified}'",
                param.name.name
            )));
        }
    }
    Ok(())
}
