//! Implementation of the `docfill render` and `docfill pdf` commands.

use crate::cli::{PdfArgs, RenderArgs};
use crate::documents::DocumentId;
use crate::error::{DocfillError, Result};
use crate::fs::{atomic_write, atomic_write_file};
use crate::service::TemplateService;
use crate::template::Source;

/// Execute the `docfill render` command.
///
/// The filled HTML goes to `--output` or stdout. Sentinels for missing or
/// failing rules do not make the command fail; `--report` lists them.
pub async fn cmd_render(service: &TemplateService, args: RenderArgs) -> Result<()> {
    let document = DocumentId::parse(&args.document.document)?;
    let result = service.render(&document).await?;

    match &args.output {
        Some(path) => {
            atomic_write_file(path, &result.html)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", result.html),
    }

    if args.report {
        for resolution in &result.placeholders {
            let source = match resolution.source {
                Source::Static => "static",
                Source::Dynamic => "dynamic",
                Source::Missing => "missing",
                Source::Error => "error",
            };
            match &resolution.error {
                Some(error) => eprintln!("  {:8} {} ({})", source, resolution.tag, error),
                None => eprintln!("  {:8} {}", source, resolution.tag),
            }
        }
    }
    Ok(())
}

/// Execute the `docfill pdf` command.
pub async fn cmd_pdf(service: &TemplateService, args: PdfArgs) -> Result<()> {
    let html = std::fs::read_to_string(&args.input).map_err(|e| {
        DocfillError::Validation(format!("failed to read '{}': {}", args.input.display(), e))
    })?;
    let pdf = service.export_pdf(&html).await?;
    atomic_write(&args.output, &pdf)?;
    println!("Wrote {} ({} bytes)", args.output.display(), pdf.len());
    Ok(())
}
