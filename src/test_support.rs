use crate::config::Config;
use crate::error::{DocfillError, Result};
use crate::llm::{CompletionRequest, TextGenerator};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Text generator returning a canned reply and recording requests.
pub(crate) struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(DocfillError::Upstream(message.clone())),
        }
    }
}

/// Erase the concrete generator type.
pub(crate) fn as_client(generator: &Arc<ScriptedGenerator>) -> Arc<dyn TextGenerator> {
    generator.clone()
}

/// Config rooted at `data_dir` that runs rules and PDF conversion with `sh`
/// and `cp`, so tests need neither Node nor a PDF renderer.
pub(crate) fn sh_config(data_dir: &Path) -> Config {
    let mut config = Config {
        data_dir: data_dir.to_path_buf(),
        ..Config::default()
    };
    config.executor.command = "sh {artifact}".to_string();
    config.executor.timeout_seconds = 5;
    config.pdf.command = "cp {input} {output}".to_string();
    config.pdf.timeout_seconds = 5;
    config
}

pub(crate) const SAMPLE_HTML: &str =
    "<h1>/*Title*/</h1><p>/*Name*/ earns /*Salary*/ in /*City*/</p>";

pub(crate) const SAMPLE_XML: &str = "<offer><Title>Offer</Title><candidate><Name>Ann</Name>\
     <City>Oslo</City></candidate><Base>5000</Base></offer>";
