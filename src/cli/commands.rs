//! Command handlers.
//!
//! Every handler writes user-facing output to `out` so the binary can pass
//! stdout and tests can pass a buffer.

use color_eyre::eyre::{eyre, Result, WrapErr};
use std::io::Write;
use std::path::Path;

use super::args::{CliCommand, USAGE};
use super::version::version_line;
use crate::context::AppContext;
use crate::models::DocumentUpload;
use crate::session::SessionUpdate;

/// Run a command that needs neither the backend nor storage.
///
/// # Returns
///
/// * `None` - the command needs an [`AppContext`]; use [`run_command`]
/// * `Some(result)` - the command ran
pub fn run_local_command<W: Write>(command: &CliCommand, out: &mut W) -> Option<Result<()>> {
    let result: Result<()> = match command {
        CliCommand::Version => writeln!(out, "{}", version_line()).map_err(Into::into),
        CliCommand::Help => writeln!(out, "{}", USAGE).map_err(Into::into),
        CliCommand::Invalid(message) => Err(eyre!("{}\n\n{}", message, USAGE)),
        _ => return None,
    };
    Some(result)
}

/// Run any command against `ctx`.
pub async fn run_command<W: Write + Send>(
    ctx: &AppContext,
    command: CliCommand,
    out: &mut W,
) -> Result<()> {
    if let Some(result) = run_local_command(&command, out) {
        return result;
    }

    match command {
        CliCommand::Ask { term, save } => ask(ctx, &term, save, out).await,
        CliCommand::List => list(ctx, out).await,
        CliCommand::Review { id } => review(ctx, &id, out).await,
        CliCommand::Remove { id } => {
            ctx.bookmarks()
                .remove(&id)
                .await
                .wrap_err("Failed to remove entry")?;
            writeln!(out, "Removed {}", id)?;
            Ok(())
        }
        CliCommand::Health => {
            let healthy = ctx
                .backend()
                .health_check()
                .await
                .wrap_err_with(|| format!("Backend at {} is unreachable", ctx.backend().base_url()))?;
            writeln!(out, "{}", if healthy { "ok" } else { "unhealthy" })?;
            Ok(())
        }
        CliCommand::Upload { path, team_key } => upload(ctx, &path, &team_key, out).await,
        CliCommand::Query { question, top_k } => {
            let answer = ctx
                .backend()
                .query_documents(&question, top_k)
                .await
                .wrap_err("Document query failed")?;
            writeln!(out, "{}", answer.answer)?;
            Ok(())
        }
        CliCommand::Version | CliCommand::Help | CliCommand::Invalid(_) => Ok(()),
    }
}

fn write_update<W: Write>(out: &mut W, update: SessionUpdate) -> std::io::Result<()> {
    if let SessionUpdate::Delta(text) = update {
        write!(out, "{}", text)?;
        out.flush()?;
    }
    Ok(())
}

async fn ask<W: Write + Send>(ctx: &AppContext, term: &str, save: bool, out: &mut W) -> Result<()> {
    let session = ctx.open_session();
    let mut updates = session.subscribe();

    let send = session.send(term);
    tokio::pin!(send);
    let result = loop {
        tokio::select! {
            biased;
            Some(update) = updates.recv() => write_update(out, update)?,
            result = &mut send => break result,
        }
    };
    while let Ok(update) = updates.try_recv() {
        write_update(out, update)?;
    }
    writeln!(out)?;

    let answer = result.map_err(|e| eyre!("{} {}", e.user_message(), e.recovery_hint()))?;
    if answer.content.is_empty() {
        writeln!(out, "(no answer)")?;
    }

    if save {
        match session
            .bookmark_last_answer(ctx.bookmarks())
            .await
            .wrap_err("Failed to save entry")?
        {
            Some(entry) => writeln!(out, "Saved as {}", entry.id)?,
            None => writeln!(out, "Nothing to save")?,
        }
    }
    Ok(())
}

async fn list<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    let entries = ctx
        .bookmarks()
        .entries()
        .await
        .wrap_err("Failed to read entries")?;
    if entries.is_empty() {
        writeln!(out, "No saved entries.")?;
    }
    for entry in entries {
        writeln!(
            out,
            "{}  {}  {}  (reviewed {}x)",
            entry.id,
            entry.created_at.format("%Y-%m-%d"),
            entry.term,
            entry.review_count
        )?;
    }
    Ok(())
}

async fn review<W: Write>(ctx: &AppContext, id: &str, out: &mut W) -> Result<()> {
    let entries = ctx
        .bookmarks()
        .entries()
        .await
        .wrap_err("Failed to read entries")?;
    let entry = entries
        .into_iter()
        .find(|e| e.id == id)
        .ok_or_else(|| eyre!("No saved entry with id {}", id))?;

    ctx.bookmarks()
        .record_review(id)
        .await
        .wrap_err("Failed to record review")?;

    writeln!(out, "{}\n\n{}", entry.term, entry.explanation)?;
    Ok(())
}

async fn upload<W: Write>(ctx: &AppContext, path: &str, team_key: &str, out: &mut W) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let upload = DocumentUpload::new(file_name, mime_for(path), bytes);

    let response = ctx
        .backend()
        .upload_document(upload, team_key)
        .await
        .wrap_err("Upload failed")?;

    match (response.success, response.document_id) {
        (true, Some(id)) => writeln!(out, "Uploaded as {}", id)?,
        (true, None) => writeln!(out, "Uploaded")?,
        (false, _) => {
            return Err(eyre!(
                "Upload rejected: {}",
                response.message.unwrap_or_else(|| "no reason given".to_string())
            ))
        }
    }
    Ok(())
}

fn mime_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryBookmarks, MockHttpClient, MockResponse};
    use crate::config::GlossaConfig;
    use crate::traits::{BookmarkSink, Response};
    use bytes::Bytes;
    use std::sync::Arc;

    fn context(mock: &MockHttpClient, bookmarks: &InMemoryBookmarks) -> AppContext {
        AppContext::new(
            GlossaConfig::default().with_base_url("http://backend.test"),
            Arc::new(mock.clone()),
            Arc::new(bookmarks.clone()),
        )
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_local_commands() {
        let mut out = Vec::new();
        assert!(run_local_command(&CliCommand::Version, &mut out)
            .unwrap()
            .is_ok());
        assert!(output(out).starts_with("glossa "));

        let mut out = Vec::new();
        let result = run_local_command(&CliCommand::Invalid("bad".to_string()), &mut out).unwrap();
        assert!(result.unwrap_err().to_string().contains("Usage"));

        assert!(run_local_command(&CliCommand::List, &mut Vec::<u8>::new()).is_none());
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a/b/Report.PDF"), "application/pdf");
        assert_eq!(mime_for("notes"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_ask_streams_and_saves() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Stream(vec![
            Bytes::from_static(b"data: {\"type\":\"content\",\"delta\":\"Moves \"}\n"),
            Bytes::from_static(b"data: {\"type\":\"content\",\"delta\":\"ownership\"}\n"),
            Bytes::from_static(b"data: {\"type\":\"done\"}\n"),
        ]));
        let bookmarks = InMemoryBookmarks::new();
        let ctx = context(&mock, &bookmarks);

        let mut out = Vec::new();
        run_command(
            &ctx,
            CliCommand::Ask {
                term: "move".to_string(),
                save: true,
            },
            &mut out,
        )
        .await
        .unwrap();

        let text = output(out);
        assert!(text.starts_with("Moves ownership\n"));
        assert!(text.contains("Saved as"));
        let entries = bookmarks.get_entries();
        assert_eq!(entries[0].term, "move");
        assert_eq!(entries[0].explanation, "Moves ownership");
    }

    #[tokio::test]
    async fn test_ask_failure_is_reported() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(
            crate::error::TransportError::Status {
                status: 503,
                body: "busy".to_string(),
            },
        ));
        let bookmarks = InMemoryBookmarks::new();
        let ctx = context(&mock, &bookmarks);

        let result = run_command(
            &ctx,
            CliCommand::Ask {
                term: "x".to_string(),
                save: true,
            },
            &mut Vec::<u8>::new(),
        )
        .await;

        assert!(result.is_err());
        assert!(bookmarks.get_entries().is_empty());
    }

    #[tokio::test]
    async fn test_list_review_remove() {
        let mock = MockHttpClient::new();
        let bookmarks = InMemoryBookmarks::new();
        let entry = bookmarks.add("trait object", "Dynamic dispatch").await.unwrap();
        let ctx = context(&mock, &bookmarks);

        let mut out = Vec::new();
        run_command(&ctx, CliCommand::List, &mut out).await.unwrap();
        assert!(output(out).contains("trait object"));

        let mut out = Vec::new();
        run_command(&ctx, CliCommand::Review { id: entry.id.clone() }, &mut out)
            .await
            .unwrap();
        assert!(output(out).contains("Dynamic dispatch"));
        assert_eq!(bookmarks.get_entries()[0].review_count, 1);

        assert!(run_command(&ctx, CliCommand::Review { id: "nope".to_string() }, &mut Vec::<u8>::new())
            .await
            .is_err());

        run_command(&ctx, CliCommand::Remove { id: entry.id }, &mut Vec::<u8>::new())
            .await
            .unwrap();
        let mut out = Vec::new();
        run_command(&ctx, CliCommand::List, &mut out).await.unwrap();
        assert_eq!(output(out), "No saved entries.\n");
    }

    #[tokio::test]
    async fn test_health() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));
        let ctx = context(&mock, &InMemoryBookmarks::new());

        let mut out = Vec::new();
        run_command(&ctx, CliCommand::Health, &mut out).await.unwrap();
        assert_eq!(output(out), "ok\n");
    }
}
