//! Implementation of the `docfill upload` and `docfill tags` commands.

use crate::cli::{TagsArgs, UploadArgs};
use crate::documents::DocumentId;
use crate::error::{DocfillError, Result};
use crate::service::{TagKind, TemplateService};
use std::path::Path;

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        DocfillError::Validation(format!("failed to read '{}': {}", path.display(), e))
    })
}

/// Execute the `docfill upload` command.
pub fn cmd_upload(service: &TemplateService, args: UploadArgs) -> Result<()> {
    let document = DocumentId::parse(&args.document.document)?;
    let html = read_input(&args.html)?;
    let xml = read_input(&args.xml)?;

    let stored = service.upload(&document, &html, &xml)?;

    println!("Uploaded document '{}'", stored.document);
    println!("  Template: {}", stored.html_path.display());
    println!("  Data:     {} ({} values)", stored.xml_path.display(), stored.values);
    Ok(())
}

/// Execute the `docfill tags` command.
pub fn cmd_tags(service: &TemplateService, args: TagsArgs) -> Result<()> {
    let document = DocumentId::parse(&args.document.document)?;
    let tags = service.tags(&document)?;

    if args.json {
        let json = serde_json::to_string_pretty(&tags)
            .map_err(|e| DocfillError::Storage(format!("failed to serialize tags: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if tags.is_empty() {
        println!("No placeholders found in document '{}'.", document);
        return Ok(());
    }

    let width = tags.iter().map(|t| t.tag.len()).max().unwrap_or(3).max(3);
    println!("{:width$}  {:7}  {:4}  VALUE", "TAG", "TYPE", "RULE", width = width);
    for info in &tags {
        let kind = match info.kind {
            TagKind::Static => "static",
            TagKind::Dynamic => "dynamic",
        };
        let rule = if info.rule_exists { "yes" } else { "-" };
        println!(
            "{:width$}  {:7}  {:4}  {}",
            info.tag,
            kind,
            rule,
            info.value.as_deref().unwrap_or(""),
            width = width
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DocumentArg;
    use crate::test_support::{SAMPLE_HTML, SAMPLE_XML, sh_config};
    use tempfile::TempDir;

    fn document(id: &str) -> DocumentArg {
        DocumentArg {
            document: id.to_string(),
        }
    }

    #[test]
    fn test_upload_reads_files_and_stores_them() {
        let temp_dir = TempDir::new().unwrap();
        let service = TemplateService::new(sh_config(&temp_dir.path().join("data")), None).unwrap();
        let html = temp_dir.path().join("offer.html");
        let xml = temp_dir.path().join("offer.xml");
        std::fs::write(&html, SAMPLE_HTML).unwrap();
        std::fs::write(&xml, SAMPLE_XML).unwrap();

        cmd_upload(
            &service,
            UploadArgs {
                html,
                xml,
                document: document("offer-1"),
            },
        )
        .unwrap();

        cmd_tags(
            &service,
            TagsArgs {
                document: document("offer-1"),
                json: true,
            },
        )
        .unwrap();
        let tags = service.tags(&DocumentId::parse("offer-1").unwrap()).unwrap();
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn test_missing_input_file_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = TemplateService::new(sh_config(temp_dir.path()), None).unwrap();

        let err = cmd_upload(
            &service,
            UploadArgs {
                html: temp_dir.path().join("absent.html"),
                xml: temp_dir.path().join("absent.xml"),
                document: document("default"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DocfillError::Validation(ref m) if m.contains("absent.html")));
    }

    #[test]
    fn test_invalid_document_id_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let service = TemplateService::new(sh_config(temp_dir.path()), None).unwrap();

        let err = cmd_tags(
            &service,
            TagsArgs {
                document: document("../etc"),
                json: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DocfillError::Validation(_)));
    }
}
