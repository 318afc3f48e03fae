//! Operations shared by the CLI and the HTTP surface.
//!
//! [`TemplateService`] wires the stores, the rule generator and executor and
//! the PDF converter together from one [`Config`]. Handlers on both surfaces
//! are thin wrappers around its methods, so they report identical results
//! and errors.

use crate::config::Config;
use crate::context::Workspace;
use crate::documents::{DocumentId, DocumentStore, StoredDocument};
use crate::error::{DocfillError, Result};
use crate::events::{self, Event, EventAction};
use crate::llm::{OpenAiClient, TextGenerator};
use crate::pdf::PdfConverter;
use crate::rules::{
    GeneratedRule, RuleExecutor, RuleGenerator, RuleStore, StoredRule, check_request, validate_tag,
};
use crate::template::{self, RenderResult, Source, extract_placeholders};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// How a placeholder will be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Static,
    Dynamic,
}

/// One entry of the tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: TagKind,
    /// The data value for static tags, `null` for dynamic ones.
    pub value: Option<String>,
    pub rule_exists: bool,
}

pub struct TemplateService {
    config: Config,
    workspace: Workspace,
    generator: RuleGenerator,
    executor: RuleExecutor,
    pdf: PdfConverter,
}

impl TemplateService {
    /// Build the service with an explicit text-generation client.
    pub fn new(config: Config, client: Option<Arc<dyn TextGenerator>>) -> Result<Self> {
        config.validate()?;
        let workspace = Workspace::new(&config.data_dir);
        let executor = RuleExecutor::from_config(workspace.rules(), &config.executor)?;
        let pdf = PdfConverter::from_config(&config.pdf)?;
        let generator = RuleGenerator::new(client, workspace.rules(), config.generator.clone());
        if !generator.is_configured() {
            warn!(
                env = %config.generator.api_key_env,
                "text generation service not configured; rule generation is disabled"
            );
        }
        Ok(Self {
            config,
            workspace,
            generator,
            executor,
            pdf,
        })
    }

    /// Build the service, reading the API key from the configured variable.
    ///
    /// A missing key is not fatal: only rule generation needs it.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = OpenAiClient::from_config(&config.generator)?;
        let client = client.map(|c| Arc::new(c) as Arc<dyn TextGenerator>);
        Self::new(config, client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn documents(&self) -> DocumentStore {
        self.workspace.documents()
    }

    fn rules(&self) -> &RuleStore {
        self.executor.store()
    }

    /// Store a template and its data file under `document`.
    pub fn upload(&self, document: &DocumentId, html: &[u8], xml: &[u8]) -> Result<StoredDocument> {
        let stored = self.documents().save(document, html, xml)?;
        events::record(
            &self.workspace,
            Event::new(EventAction::Upload)
                .with_document(document.as_str())
                .with_details(json!({
                    "html_bytes": html.len(),
                    "xml_bytes": xml.len(),
                    "values": stored.values,
                })),
        );
        Ok(stored)
    }

    /// Placeholders of the uploaded template with their classification.
    pub fn tags(&self, document: &DocumentId) -> Result<Vec<TagInfo>> {
        let doc = self.documents().load(document)?;
        let rules = self.rules();
        Ok(extract_placeholders(&doc.html)
            .into_iter()
            .map(|tag| {
                let value = doc.data.get(&tag).map(str::to_string);
                TagInfo {
                    kind: if value.is_some() {
                        TagKind::Static
                    } else {
                        TagKind::Dynamic
                    },
                    value,
                    rule_exists: rules.exists(&tag),
                    tag,
                }
            })
            .collect())
    }

    /// Generate and store the rule for `tag` from `prompt`.
    ///
    /// The sample holds the first `example_limit` entries of the document's
    /// data (the configured limit when `None`).
    pub async fn generate_rule(
        &self,
        document: &DocumentId,
        tag: &str,
        prompt: &str,
        example_limit: Option<usize>,
    ) -> Result<GeneratedRule> {
        check_request(tag, prompt)?;
        let data = self.documents().load_data(document)?;
        let limit = example_limit.unwrap_or_else(|| self.generator.example_limit());
        let sample = data.sample(limit);

        let rule = self.generator.generate(tag, prompt, &sample).await?;

        events::record(
            &self.workspace,
            Event::new(EventAction::RuleGenerate)
                .with_document(document.as_str())
                .with_tag(tag)
                .with_details(json!({
                    "rule_file": rule.path.display().to_string(),
                    "sample_size": sample.len(),
                })),
        );
        Ok(rule)
    }

    /// Run the stored rule for `tag` against the document's full data.
    pub async fn test_rule(&self, document: &DocumentId, tag: &str) -> Result<String> {
        validate_tag(tag)?;
        self.rules().require(tag)?;
        let data = self.documents().load_data(document)?;
        self.executor.execute(tag, &data).await
    }

    /// Render the uploaded template.
    ///
    /// Rule failures become inline sentinels; only a missing or unreadable
    /// upload fails the call.
    pub async fn render(&self, document: &DocumentId) -> Result<RenderResult> {
        let doc = self.documents().load(document)?;
        let result = template::render(
            &doc.html,
            &doc.data,
            &self.executor,
            self.config.executor.max_concurrent,
        )
        .await;

        let count = |source: Source| {
            result
                .placeholders
                .iter()
                .filter(|r| r.source == source)
                .count()
        };
        info!(
            document = %document,
            placeholders = result.placeholders.len(),
            dynamic = count(Source::Dynamic),
            missing = count(Source::Missing),
            errors = count(Source::Error),
            "document rendered"
        );
        Ok(result)
    }

    /// Convert final HTML to PDF bytes.
    pub async fn export_pdf(&self, html: &str) -> Result<Vec<u8>> {
        if html.trim().is_empty() {
            return Err(DocfillError::Validation("html required in body".to_string()));
        }
        self.pdf.convert(html).await
    }

    pub fn list_rules(&self) -> Result<Vec<StoredRule>> {
        self.rules().list()
    }

    /// Delete the stored rule for `tag`.
    pub fn remove_rule(&self, tag: &str) -> Result<PathBuf> {
        validate_tag(tag)?;
        let path = self.rules().remove(tag)?;
        info!(tag, path = %path.display(), "rule removed");
        events::record(
            &self.workspace,
            Event::new(EventAction::RuleRemove)
                .with_tag(tag)
                .with_details(json!({ "rule_file": path.display().to_string() })),
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_events;
    use crate::test_support::{SAMPLE_HTML, SAMPLE_XML, ScriptedGenerator, as_client, sh_config};
    use tempfile::TempDir;

    fn service_with(
        temp_dir: &TempDir,
        client: Option<&Arc<ScriptedGenerator>>,
    ) -> TemplateService {
        TemplateService::new(sh_config(temp_dir.path()), client.map(as_client)).unwrap()
    }

    fn uploaded(temp_dir: &TempDir) -> TemplateService {
        let service = service_with(temp_dir, None);
        service
            .upload(
                &DocumentId::default(),
                SAMPLE_HTML.as_bytes(),
                SAMPLE_XML.as_bytes(),
            )
            .unwrap();
        service
    }

    #[test]
    fn test_upload_records_an_event() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);

        let events = read_events(service.workspace()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::Upload);
        assert_eq!(events[0].document.as_deref(), Some("default"));
        assert_eq!(events[0].details["values"], 4);
    }

    #[test]
    fn test_tags_classify_placeholders() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);
        service.rules().write("Salary", "echo 60000").unwrap();

        let tags = service.tags(&DocumentId::default()).unwrap();

        let names: Vec<_> = tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["Title", "Name", "Salary", "City"]);
        assert_eq!(tags[1].kind, TagKind::Static);
        assert_eq!(tags[1].value.as_deref(), Some("Ann"));
        assert_eq!(tags[2].kind, TagKind::Dynamic);
        assert_eq!(tags[2].value, None);
        assert!(tags[2].rule_exists);
        assert!(!tags[0].rule_exists);

        let json = serde_json::to_value(&tags[2]).unwrap();
        assert_eq!(
            json,
            json!({"tag": "Salary", "type": "dynamic", "value": null, "rule_exists": true})
        );
    }

    #[test]
    fn test_tags_before_upload_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = service_with(&temp_dir, None)
            .tags(&DocumentId::default())
            .unwrap_err();
        assert!(matches!(err, DocfillError::Validation(_)));
    }

    #[tokio::test]
    async fn test_render_mixes_static_dynamic_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);
        service.rules().write("Salary", "echo 60000").unwrap();
        service
            .rules()
            .write("City", "echo never used")
            .unwrap();

        let result = service.render(&DocumentId::default()).await.unwrap();

        assert_eq!(result.html, "<h1>Offer</h1><p>Ann earns 60000 in Oslo</p>");
    }

    #[tokio::test]
    async fn test_render_degrades_failing_rules_to_sentinels() {
        let temp_dir = TempDir::new().unwrap();
        let service = service_with(&temp_dir, None);
        service
            .upload(
                &DocumentId::default(),
                b"/*Broken*/ and /*Absent*/",
                b"<r/>",
            )
            .unwrap();
        service
            .rules()
            .write("Broken", "echo oops >&2; exit 3")
            .unwrap();

        let result = service.render(&DocumentId::default()).await.unwrap();

        assert_eq!(result.html, "[RULE_ERROR:Broken] and [MISSING_RULE:Absent]");
        assert_eq!(result.placeholders[0].source, Source::Error);
        assert!(result.placeholders[0].error.as_deref().unwrap().contains("oops"));
    }

    #[tokio::test]
    async fn test_render_keeps_documents_apart() {
        let temp_dir = TempDir::new().unwrap();
        let service = service_with(&temp_dir, None);
        let a = DocumentId::parse("a").unwrap();
        let b = DocumentId::parse("b").unwrap();
        service.upload(&a, b"/*V*/", b"<r><V>one</V></r>").unwrap();
        service.upload(&b, b"/*V*/", b"<r><V>two</V></r>").unwrap();

        assert_eq!(service.render(&a).await.unwrap().html, "one");
        assert_eq!(service.render(&b).await.unwrap().html, "two");
    }

    #[tokio::test]
    async fn test_generate_rule_uses_sample_and_records_event() {
        let temp_dir = TempDir::new().unwrap();
        let client = ScriptedGenerator::replying("function generate_Salary(d) { return '1'; }");
        let service = service_with(&temp_dir, Some(&client));
        service
            .upload(
                &DocumentId::default(),
                SAMPLE_HTML.as_bytes(),
                SAMPLE_XML.as_bytes(),
            )
            .unwrap();

        let rule = service
            .generate_rule(&DocumentId::default(), "Salary", "yearly pay", Some(2))
            .await
            .unwrap();

        assert!(rule.path.ends_with("rule_Salary.js"));
        let request = client.last_request();
        assert!(request.user.contains("\"Title\": \"Offer\""));
        assert!(request.user.contains("\"Name\": \"Ann\""));
        assert!(!request.user.contains("Oslo"));

        let events = read_events(service.workspace()).unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.action, EventAction::RuleGenerate);
        assert_eq!(last.tag.as_deref(), Some("Salary"));
        assert_eq!(last.details["sample_size"], 2);
    }

    #[tokio::test]
    async fn test_generate_rule_requires_uploaded_data() {
        let temp_dir = TempDir::new().unwrap();
        let client = ScriptedGenerator::replying("function f() {}");
        let service = service_with(&temp_dir, Some(&client));

        let err = service
            .generate_rule(&DocumentId::default(), "Salary", "yearly pay", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DocfillError::Validation(ref m) if m.contains("XML file not uploaded")));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_rule_without_client_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);

        let err = service
            .generate_rule(&DocumentId::default(), "Salary", "yearly pay", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DocfillError::Configuration(_)));
        assert!(!service.rules().exists("Salary"));
    }

    #[tokio::test]
    async fn test_rule_checks_rule_before_data() {
        let temp_dir = TempDir::new().unwrap();
        let service = service_with(&temp_dir, None);

        let err = service
            .test_rule(&DocumentId::default(), "Salary")
            .await
            .unwrap_err();
        assert!(matches!(err, DocfillError::NotFound(ref m) if m == "Rule file not found: rule_Salary.js"));

        service.rules().write("Salary", "echo 1").unwrap();
        let err = service
            .test_rule(&DocumentId::default(), "Salary")
            .await
            .unwrap_err();
        assert!(matches!(err, DocfillError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rule_returns_value() {
        let temp_dir = TempDir::new().unwrap();
        let service = uploaded(&temp_dir);
        service.rules().write("Salary", "echo '  60000  '").unwrap();

        let value = service
            .test_rule(&DocumentId::default(), "Salary")
            .await
            .unwrap();
        assert_eq!(value, "60000");
    }

    #[tokio::test]
    async fn test_export_pdf_requires_html() {
        let temp_dir = TempDir::new().unwrap();
        let service = service_with(&temp_dir, None);

        assert!(matches!(
            service.export_pdf("  ").await.unwrap_err(),
            DocfillError::Validation(_)
        ));
        assert_eq!(service.export_pdf("<p>x</p>").await.unwrap(), b"<p>x</p>");
    }

    #[test]
    fn test_remove_rule_deletes_and_records_event() {
        let temp_dir = TempDir::new().unwrap();
        let service = service_with(&temp_dir, None);
        service.rules().write("Salary", "echo 1").unwrap();
        assert_eq!(service.list_rules().unwrap().len(), 1);

        service.remove_rule("Salary").unwrap();

        assert!(service.list_rules().unwrap().is_empty());
        assert!(matches!(
            service.remove_rule("Salary").unwrap_err(),
            DocfillError::NotFound(_)
        ));
        let events = read_events(service.workspace()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::RuleRemove);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = sh_config(temp_dir.path());
        config.executor.command = "sh".to_string();
        assert!(matches!(
            TemplateService::new(config, None),
            Err(DocfillError::Configuration(_))
        ));
    }
}
