//! Implementation of the `docfill events` command.

use crate::cli::EventsArgs;
use crate::config::Config;
use crate::context::Workspace;
use crate::error::Result;
use crate::events::{Event, read_events};

/// Execute the `docfill events` command.
///
/// Reads the log directly, so it works without a credential or a valid
/// executor setup.
pub fn cmd_events(config: &Config, args: EventsArgs) -> Result<()> {
    let workspace = Workspace::new(&config.data_dir);
    let events = read_events(&workspace)?;

    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let skip = match args.tail {
        0 => 0,
        n => events.len().saturating_sub(n),
    };
    for event in &events[skip..] {
        println!("{}", format_event(event));
    }
    Ok(())
}

fn format_event(event: &Event) -> String {
    let mut line = format!(
        "{}  {:13}  {}",
        event.ts.format("%Y-%m-%d %H:%M:%S"),
        event.action.to_string(),
        event.actor
    );
    if let Some(document) = &event.document {
        line.push_str(&format!("  document={}", document));
    }
    if let Some(tag) = &event.tag {
        line.push_str(&format!("  tag={}", tag));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventAction, append_event};
    use crate::test_support::sh_config;
    use tempfile::TempDir;

    #[test]
    fn test_format_includes_optional_fields() {
        let event = Event::new(EventAction::RuleGenerate)
            .with_document("default")
            .with_tag("Salary");
        let line = format_event(&event);
        assert!(line.contains("rule_generate"));
        assert!(line.contains("document=default"));
        assert!(line.ends_with("tag=Salary"));

        let line = format_event(&Event::new(EventAction::Upload));
        assert!(!line.contains("tag="));
    }

    #[test]
    fn test_events_command_reads_log() {
        let temp_dir = TempDir::new().unwrap();
        let config = sh_config(temp_dir.path());
        cmd_events(&config, EventsArgs { tail: 5 }).unwrap();

        let workspace = Workspace::new(&config.data_dir);
        append_event(&workspace, &Event::new(EventAction::Upload)).unwrap();
        cmd_events(&config, EventsArgs { tail: 0 }).unwrap();
    }
}
