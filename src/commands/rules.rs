//! Implementation of the rule commands: `generate`, `test-rule` and `rules`.

use crate::cli::{GenerateArgs, RulesListArgs, RulesRemoveArgs, TestRuleArgs};
use crate::documents::DocumentId;
use crate::error::{DocfillError, Result};
use crate::service::TemplateService;

/// Execute the `docfill generate` command.
///
/// Prints the stored file and the generated function body.
pub async fn cmd_generate(service: &TemplateService, args: GenerateArgs) -> Result<()> {
    let document = DocumentId::parse(&args.document.document)?;
    let rule = service
        .generate_rule(&document, &args.tag, &args.prompt, args.example_limit)
        .await?;

    println!("Generated rule for '{}'", rule.tag);
    println!("  File: {}", rule.path.display());
    println!();
    println!("{}", rule.code);
    Ok(())
}

/// Execute the `docfill test-rule` command.
pub async fn cmd_test_rule(service: &TemplateService, args: TestRuleArgs) -> Result<()> {
    let document = DocumentId::parse(&args.document.document)?;
    let value = service.test_rule(&document, &args.tag).await?;
    println!("{}", value);
    Ok(())
}

/// Execute the `docfill rules list` command.
pub fn cmd_rules_list(service: &TemplateService, args: RulesListArgs) -> Result<()> {
    let rules = service.list_rules()?;

    if args.json {
        let json = serde_json::to_string_pretty(&rules)
            .map_err(|e| DocfillError::Storage(format!("failed to serialize rules: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules stored.");
        return Ok(());
    }
    let width = rules.iter().map(|r| r.tag.len()).max().unwrap_or(3).max(3);
    println!("{:width$}  FILE", "TAG", width = width);
    for rule in &rules {
        println!("{:width$}  {}", rule.tag, rule.file, width = width);
    }
    Ok(())
}

/// Execute the `docfill rules remove` command.
pub fn cmd_rules_remove(service: &TemplateService, args: RulesRemoveArgs) -> Result<()> {
    let path = service.remove_rule(&args.tag)?;
    println!("Removed rule for '{}' ({})", args.tag, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DocumentArg;
    use crate::test_support::{SAMPLE_HTML, SAMPLE_XML, sh_config};
    use tempfile::TempDir;

    fn uploaded(temp_dir: &TempDir) -> TemplateService {
        let service = TemplateService::new(sh_config(temp_dir.path()), None).unwrap();
        service
            .upload(
                &DocumentId::default(),
                SAMPLE_HTML.as_bytes(),
                SAMPLE_XML.as_bytes(),
            )
            .unwrap();
        service
    }

    fn default_document() -> DocumentArg {
        DocumentArg {
            document: "default".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_without_credentials_fails_with_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);

        let err = cmd_generate(
            &service,
            GenerateArgs {
                tag: "Salary".to_string(),
                prompt: "yearly pay".to_string(),
                example_limit: None,
                document: default_document(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DocfillError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_rule_surfaces_execution_errors() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);
        service
            .workspace()
            .rules()
            .write("Salary", "echo broken >&2; exit 3")
            .unwrap();

        let err = cmd_test_rule(
            &service,
            TestRuleArgs {
                tag: "Salary".to_string(),
                document: default_document(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DocfillError::Execution { ref stderr, .. } if stderr == "broken"));
        assert_eq!(err.exit_code(), crate::exit_codes::RULE_FAILURE);
    }

    #[test]
    fn test_list_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);
        service.workspace().rules().write("A", "echo a").unwrap();

        cmd_rules_list(&service, RulesListArgs { json: false }).unwrap();
        cmd_rules_remove(
            &service,
            RulesRemoveArgs {
                tag: "A".to_string(),
            },
        )
        .unwrap();

        let err = cmd_rules_remove(
            &service,
            RulesRemoveArgs {
                tag: "A".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DocfillError::NotFound(_)));
    }
}
