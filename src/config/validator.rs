use std::collections::HashSet;

use crate::error::{AppError, Result};

use super::{catalog_key, CallMode, EndpointContract, HttpMethod};

/// Check a set of contracts and report every problem in one error.
pub fn validate_contracts(contracts: &[EndpointContract]) -> Result<()> {
    let mut issues = Vec::new();

    if contracts.is_empty() {
        issues.push("catalog must declare at least one endpoint".to_string());
    }

    let mut seen = HashSet::new();
    for contract in contracts {
        validate_contract(contract, &mut issues);
        if !seen.insert(catalog_key(&contract.name)) {
            issues.push(format!("duplicate endpoint name `{}`", contract.name));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "Endpoint catalog validation failed:\n - {}",
            issues.join("\n - ")
        )))
    }
}

fn validate_contract(contract: &EndpointContract, issues: &mut Vec<String>) {
    let label = if contract.name.trim().is_empty() {
        "<unnamed>"
    } else {
        contract.name.as_str()
    };

    if contract.name.trim().is_empty() {
        issues.push("endpoint name must not be empty".to_string());
    }

    if contract.path.trim().is_empty() {
        issues.push(format!("{label}: path must not be empty"));
    } else if contract.path.contains(char::is_whitespace) {
        issues.push(format!("{label}: path must not contain whitespace"));
    }

    if contract.page_size == Some(0) {
        issues.push(format!("{label}: page_size must be greater than zero"));
    }

    if contract.required.iter().any(|field| field.trim().is_empty()) {
        issues.push(format!("{label}: required fields must not be blank"));
    }

    if matches!(contract.mode, CallMode::Chunked { .. })
        && contract.method != HttpMethod::Get
    {
        issues.push(format!("{label}: chunked endpoints must use GET"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointCatalog;
    use crate::fetch::Params;

    fn contract(name: &str, path: &str) -> EndpointContract {
        EndpointContract {
            name: name.to_string(),
            path: path.to_string(),
            method: HttpMethod::Get,
            mode: CallMode::Chunked { max_days: 29 },
            page_size: None,
            required: Vec::new(),
            defaults: Params::new(),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = EndpointCatalog::builtin().expect("builtin catalog");
        let contracts: Vec<_> = catalog.iter().cloned().collect();
        validate_contracts(&contracts).expect("builtin contracts validate");
    }

    #[test]
    fn collects_every_issue() {
        let mut zero_page = contract("zero", "zero");
        zero_page.page_size = Some(0);
        let mut blank_required = contract("blank", "blank");
        blank_required.required = vec![" ".to_string()];
        let mut chunked_post = contract("agent", "tmai");
        chunked_post.method = HttpMethod::Post;

        let err = validate_contracts(&[
            contract("dup", "a"),
            contract("DUP", "b"),
            contract("nopath", ""),
            zero_page,
            blank_required,
            chunked_post,
        ])
        .expect_err("validation should fail");

        let message = err.to_string();
        for expected in [
            "duplicate endpoint name `DUP`",
            "nopath: path must not be empty",
            "zero: page_size must be greater than zero",
            "blank: required fields must not be blank",
            "agent: chunked endpoints must use GET",
        ] {
            assert!(message.contains(expected), "missing `{expected}` in: {message}");
        }
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = validate_contracts(&[]).expect_err("empty catalog");
        assert!(err.to_string().contains("at least one endpoint"));
    }
}
