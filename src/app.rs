//! Line-oriented terminal front end.
//!
//! Each input line is parsed into a [`Command`] and applied to the
//! [`Composer`]. Notifications raised while a command runs are printed after
//! it, in firing order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::body_format::{display_body, format_json};
use crate::composer::Composer;
use crate::db::Database;
use crate::draft::RequestDraft;
use crate::executor::RequestExecutor;
use crate::history::HistoryStore;
use crate::http_client;
use crate::key_value::is_row_empty;
use crate::notify::Notifier;
use crate::timing::{Clock, SystemClock};
use crate::transport::Transport;
use crate::types::{HttpMethod, KeyValueRow, ResponseOutcome, RowPatch};
use crate::workspace::Workspace;

const PROMPT: &str = "> ";

const HELP: &str = "\
Request
  method <GET|POST|PUT|PATCH|DELETE>
  url <address>
  param <key> [value]         fill the blank query row
  param set <i> <key> [value] | param rm <i> | param clear
  header <key> [value]        fill the blank header row
  header set <i> <key> [value] | header rm <i> | header clear
  body <json> | body format | body clear
  show                        print the draft and last response
  send
History
  history | history rm <i> | history clear
  recall <i>                  load method and URL from history
Collections
  collections
  expand <collection> | collapse <collection>
  select <endpoint>
  new-collection [name] | rm-collection <collection>
  rename-collection <collection> <name>
  base-url <collection> [url]
  new-endpoint <collection>   seeded from the draft
  rm-endpoint <collection> <endpoint>
  rename-endpoint <collection> <endpoint> <name>
  help | quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command `{0}`. Type `help` for a list.")]
    Unknown(String),

    #[error("Unknown method `{0}`.")]
    UnknownMethod(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Edits applied to one key/value row list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEdit {
    /// Fill the trailing blank row, appending one first if needed
    Add { key: String, value: String },
    Set {
        index: usize,
        key: String,
        value: String,
    },
    Remove(usize),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowList {
    Params,
    Headers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEdit {
    Set(String),
    Format,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEdit {
    List,
    Remove(usize),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Method(HttpMethod),
    Url(String),
    Rows(RowList, RowEdit),
    Body(BodyEdit),
    Show,
    Send,
    History(HistoryEdit),
    Recall(usize),
    Collections,
    Expand(String),
    Collapse(String),
    Select(String),
    NewCollection(Option<String>),
    RemoveCollection(String),
    RenameCollection { id: String, name: String },
    BaseUrl { id: String, url: String },
    NewEndpoint(String),
    RemoveEndpoint { collection_id: String, endpoint_id: String },
    RenameEndpoint {
        collection_id: String,
        endpoint_id: String,
        name: String,
    },
    Help,
    Quit,
}

/// First whitespace-delimited word and the trimmed remainder.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn required<'a>(word: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if word.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(word)
    }
}

fn index(word: &str, usage: &'static str) -> Result<usize, CommandError> {
    word.parse().map_err(|_| CommandError::Usage(usage))
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let (name, rest) = split_word(line);
        if name.is_empty() {
            return Ok(None);
        }

        let command = match name {
            "method" => {
                let method = required(rest, "method <GET|POST|PUT|PATCH|DELETE>")?;
                Command::Method(
                    HttpMethod::parse(method)
                        .ok_or_else(|| CommandError::UnknownMethod(method.to_string()))?,
                )
            }
            "url" => Command::Url(rest.to_string()),
            "param" => Command::Rows(
                RowList::Params,
                Self::parse_row_edit(rest, "param <key> [value] | set <i> <key> [value] | rm <i> | clear")?,
            ),
            "header" => Command::Rows(
                RowList::Headers,
                Self::parse_row_edit(rest, "header <key> [value] | set <i> <key> [value] | rm <i> | clear")?,
            ),
            "body" => match rest {
                "format" => Command::Body(BodyEdit::Format),
                "clear" | "" => Command::Body(BodyEdit::Clear),
                text => Command::Body(BodyEdit::Set(text.to_string())),
            },
            "show" => Command::Show,
            "send" => Command::Send,
            "history" => {
                let (sub, arg) = split_word(rest);
                match sub {
                    "" => Command::History(HistoryEdit::List),
                    "clear" => Command::History(HistoryEdit::Clear),
                    "rm" => Command::History(HistoryEdit::Remove(index(arg, "history rm <i>")?)),
                    _ => return Err(CommandError::Usage("history | history rm <i> | history clear")),
                }
            }
            "recall" => Command::Recall(index(rest, "recall <i>")?),
            "collections" => Command::Collections,
            "expand" => Command::Expand(required(rest, "expand <collection>")?.to_string()),
            "collapse" => Command::Collapse(required(rest, "collapse <collection>")?.to_string()),
            "select" => Command::Select(required(rest, "select <endpoint>")?.to_string()),
            "new-collection" => {
                Command::NewCollection(Some(rest.to_string()).filter(|name| !name.is_empty()))
            }
            "rm-collection" => {
                Command::RemoveCollection(required(rest, "rm-collection <collection>")?.to_string())
            }
            "rename-collection" => {
                const USAGE: &str = "rename-collection <collection> <name>";
                let (id, name) = split_word(rest);
                Command::RenameCollection {
                    id: required(id, USAGE)?.to_string(),
                    name: name.to_string(),
                }
            }
            "base-url" => {
                let (id, url) = split_word(rest);
                Command::BaseUrl {
                    id: required(id, "base-url <collection> [url]")?.to_string(),
                    url: url.to_string(),
                }
            }
            "new-endpoint" => {
                Command::NewEndpoint(required(rest, "new-endpoint <collection>")?.to_string())
            }
            "rm-endpoint" => {
                const USAGE: &str = "rm-endpoint <collection> <endpoint>";
                let (collection_id, endpoint_id) = split_word(rest);
                Command::RemoveEndpoint {
                    collection_id: required(collection_id, USAGE)?.to_string(),
                    endpoint_id: required(endpoint_id, USAGE)?.to_string(),
                }
            }
            "rename-endpoint" => {
                const USAGE: &str = "rename-endpoint <collection> <endpoint> <name>";
                let (collection_id, rest) = split_word(rest);
                let (endpoint_id, name) = split_word(rest);
                Command::RenameEndpoint {
                    collection_id: required(collection_id, USAGE)?.to_string(),
                    endpoint_id: required(endpoint_id, USAGE)?.to_string(),
                    name: name.to_string(),
                }
            }
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }

    fn parse_row_edit(rest: &str, usage: &'static str) -> Result<RowEdit, CommandError> {
        let (first, tail) = split_word(rest);
        match first {
            "" => Err(CommandError::Usage(usage)),
            "clear" if tail.is_empty() => Ok(RowEdit::Clear),
            "rm" => Ok(RowEdit::Remove(index(tail, usage)?)),
            "set" => {
                let (i, tail) = split_word(tail);
                let (key, value) = split_word(tail);
                Ok(RowEdit::Set {
                    index: index(i, usage)?,
                    key: required(key, usage)?.to_string(),
                    value: value.to_string(),
                })
            }
            key => Ok(RowEdit::Add {
                key: key.to_string(),
                value: tail.to_string(),
            }),
        }
    }
}

/// Whether the loop keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Buffers notifications until the current command has finished.
#[derive(Default)]
pub struct TerminalNotifier {
    lines: RefCell<Vec<String>>,
}

impl TerminalNotifier {
    fn push(&self, tag: &str, message: &str) {
        self.lines.borrow_mut().push(format!("[{}] {}", tag, message));
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

impl Notifier for TerminalNotifier {
    fn loading(&self, message: &str) {
        self.push("..", message);
    }

    fn success(&self, message: &str) {
        self.push("ok", message);
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message);
        self.push("warn", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
        self.push("error", message);
    }
}

// ============ rendering ============

fn render_rows(out: &mut String, title: &str, rows: &[KeyValueRow]) {
    let _ = writeln!(out, "{}:", title);
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (i, row) in rows.iter().enumerate() {
        if is_row_empty(row) {
            let _ = writeln!(out, "  {}  _", i);
        } else {
            let _ = writeln!(out, "  {}  {} = {}", i, row.key, row.value);
        }
    }
}

pub fn render_draft(draft: &RequestDraft) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", draft.method(), draft.url());
    render_rows(&mut out, "Params", draft.query_params());
    render_rows(&mut out, "Headers", draft.headers());
    if !draft.body().is_empty() {
        let _ = writeln!(out, "Body:\n{}", draft.body());
    }
    out
}

pub fn render_response(response: &ResponseOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({} ms)",
        response.status, response.status_text, response.elapsed_ms
    );
    for (name, value) in &response.headers {
        let _ = writeln!(out, "{}: {}", name, value);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", display_body(&response.body));
    out
}

pub fn render_history(history: &HistoryStore) -> String {
    if history.is_empty() {
        return "No history yet.\n".to_string();
    }

    let mut out = String::new();
    for (i, item) in history.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<6} {}  {} {}  {} ms",
            i, item.method, item.url, item.status, item.status_text, item.time
        );
    }
    out
}

/// Collections tree; `*` marks the active endpoint.
pub fn render_collections(workspace: &Workspace) -> String {
    if workspace.collections().is_empty() {
        return "No collections.\n".to_string();
    }

    let active = workspace.resolved_active_endpoint_id();
    let mut out = String::new();
    for collection in workspace.collections() {
        let expanded = workspace.is_expanded(&collection.id);
        let _ = write!(
            out,
            "[{}] {} ({})",
            if expanded { "-" } else { "+" },
            collection.name,
            collection.id
        );
        if !collection.base_url.is_empty() {
            let _ = write!(out, "  {}", collection.base_url);
        }
        let _ = writeln!(out);

        if !expanded {
            continue;
        }
        for endpoint in &collection.endpoints {
            let marker = if active.as_deref() == Some(endpoint.id.as_str()) {
                "*"
            } else {
                " "
            };
            let _ = writeln!(
                out,
                "  {} {:<6} {}  {} ({})",
                marker, endpoint.method, endpoint.name, endpoint.url, endpoint.id
            );
        }
    }
    out
}

// ============ app ============

pub struct ComposerApp<T, C = SystemClock> {
    composer: Composer,
    executor: RequestExecutor<T, C>,
    db: Option<Database>,
    /// Database row of each history entry, aligned with the composer's
    /// history. `None` where the entry never made it to disk.
    row_ids: VecDeque<Option<i64>>,
    notifier: TerminalNotifier,
}

impl<T: Transport, C: Clock> ComposerApp<T, C> {
    pub fn new(composer: Composer, executor: RequestExecutor<T, C>, db: Option<Database>) -> Self {
        let row_ids = std::iter::repeat(None)
            .take(composer.history().len())
            .collect();
        Self {
            composer,
            executor,
            db,
            row_ids,
            notifier: TerminalNotifier::default(),
        }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Replace the in-memory history with the newest `limit` database rows.
    pub fn restore_history(&mut self, limit: usize) -> Result<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };

        let (ids, items): (VecDeque<_>, Vec<_>) = db
            .load_recent_rows(limit)?
            .into_iter()
            .map(|(id, item)| (Some(id), item))
            .unzip();
        *self.composer.history_mut() = HistoryStore::from_recent(items);
        self.row_ids = ids;
        Ok(())
    }

    /// Interactive loop with line editing and input recall.
    pub fn run_interactive(&mut self) -> Result<()> {
        let runtime = http_client::runtime().context("starting the async runtime")?;
        let mut editor = DefaultEditor::new().context("Failed to create line editor")?;
        let mut stdout = std::io::stdout();

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if self.handle_line(runtime, &line, &mut stdout)? == Flow::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    writeln!(stdout, "Use `quit` to exit.")?;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e).context("reading command"),
            }
        }

        Ok(())
    }

    /// Read commands until `quit` or end of input, for piped input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        let runtime = http_client::runtime().context("starting the async runtime")?;

        write!(output, "{}", PROMPT)?;
        output.flush()?;

        for line in input.lines() {
            let line = line.context("reading command")?;
            if self.handle_line(runtime, &line, &mut output)? == Flow::Quit {
                break;
            }
            write!(output, "{}", PROMPT)?;
            output.flush()?;
        }

        Ok(())
    }

    fn handle_line(&mut self, runtime: &Runtime, line: &str, output: &mut dyn Write) -> Result<Flow> {
        match Command::parse(line) {
            Ok(None) => Ok(Flow::Continue),
            Ok(Some(command)) => runtime.block_on(self.execute(command, output)),
            Err(e) => {
                writeln!(output, "{}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute(&mut self, command: Command, output: &mut dyn Write) -> Result<Flow> {
        let mut text = String::new();
        let flow = self.apply(command, &mut text).await;

        for line in self.notifier.drain() {
            writeln!(output, "{}", line)?;
        }
        write!(output, "{}", text)?;
        Ok(flow)
    }

    async fn apply(&mut self, command: Command, out: &mut String) -> Flow {
        match command {
            Command::Method(method) => self.composer.draft_mut().set_method(method),
            Command::Url(url) => self.composer.draft_mut().set_url(url),
            Command::Rows(list, edit) => self.edit_rows(list, edit),
            Command::Body(edit) => self.edit_body(edit, out),
            Command::Show => {
                out.push_str(&render_draft(self.composer.draft()));
                if let Some(response) = self.composer.response() {
                    out.push('\n');
                    out.push_str(&render_response(response));
                }
            }
            Command::Send => {
                let outcome = self.composer.send(&self.executor, &self.notifier).await;
                if let Some(item) = outcome.history_item() {
                    let id = self.persist(|db| db.insert_history(item));
                    self.row_ids.push_front(id);
                }
                if let Some(response) = outcome.response() {
                    out.push_str(&render_response(response));
                }
            }
            Command::History(HistoryEdit::List) => {
                out.push_str(&render_history(self.composer.history()))
            }
            Command::History(HistoryEdit::Remove(i)) => {
                if self.composer.history_mut().remove_at(i).is_some() {
                    if let Some(Some(id)) = self.row_ids.remove(i) {
                        self.persist(|db| db.delete_history(id));
                    }
                } else {
                    let _ = writeln!(out, "No history entry {}.", i);
                }
            }
            Command::History(HistoryEdit::Clear) => {
                self.composer.history_mut().clear();
                self.row_ids.clear();
                self.persist(Database::clear_all_history);
            }
            Command::Recall(i) => {
                if self.composer.recall_history(i).is_none() {
                    let _ = writeln!(out, "No history entry {}.", i);
                }
            }
            Command::Collections => out.push_str(&render_collections(self.composer.workspace())),
            Command::Expand(id) => self.toggle(&id, true, out),
            Command::Collapse(id) => self.toggle(&id, false, out),
            Command::Select(id) => {
                if !self.composer.select_endpoint(&id) {
                    let _ = writeln!(out, "No endpoint `{}`.", id);
                }
            }
            Command::NewCollection(name) => {
                let id = self.composer.workspace_mut().add_collection(name.as_deref());
                let _ = writeln!(out, "Created collection {}.", id);
            }
            Command::RemoveCollection(id) => {
                if !self.composer.workspace_mut().delete_collection(&id) {
                    let _ = writeln!(out, "No collection `{}`.", id);
                }
            }
            Command::RenameCollection { id, name } => {
                if !self.composer.workspace_mut().rename_collection(&id, &name) {
                    let _ = writeln!(out, "No collection `{}`.", id);
                }
            }
            Command::BaseUrl { id, url } => {
                if !self.composer.workspace_mut().set_collection_base_url(&id, &url) {
                    let _ = writeln!(out, "No collection `{}`.", id);
                }
            }
            Command::NewEndpoint(collection_id) => match self.composer.add_endpoint(&collection_id) {
                Some(id) => {
                    let _ = writeln!(out, "Created endpoint {}.", id);
                }
                None => {
                    let _ = writeln!(out, "No collection `{}`.", collection_id);
                }
            },
            Command::RemoveEndpoint {
                collection_id,
                endpoint_id,
            } => {
                if !self
                    .composer
                    .workspace_mut()
                    .delete_endpoint(&collection_id, &endpoint_id)
                {
                    let _ = writeln!(out, "No endpoint `{}` in `{}`.", endpoint_id, collection_id);
                }
            }
            Command::RenameEndpoint {
                collection_id,
                endpoint_id,
                name,
            } => {
                if !self
                    .composer
                    .workspace_mut()
                    .rename_endpoint(&collection_id, &endpoint_id, &name)
                {
                    let _ = writeln!(out, "No endpoint `{}` in `{}`.", endpoint_id, collection_id);
                }
            }
            Command::Help => {
                let _ = writeln!(out, "{}", HELP);
            }
            Command::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    fn edit_rows(&mut self, list: RowList, edit: RowEdit) {
        let draft = self.composer.draft_mut();
        let rows = match list {
            RowList::Params => draft.query_params(),
            RowList::Headers => draft.headers(),
        };

        let (index, patch) = match edit {
            RowEdit::Clear => {
                match list {
                    RowList::Params => draft.clear_query_params(),
                    RowList::Headers => draft.clear_headers(),
                }
                return;
            }
            RowEdit::Remove(index) => {
                match list {
                    RowList::Params => draft.delete_query_param(index),
                    RowList::Headers => draft.delete_header(index),
                }
                return;
            }
            RowEdit::Set { index, key, value } => (index, RowPatch::both(key, value)),
            RowEdit::Add { key, value } => {
                let has_blank = rows.last().is_some_and(is_row_empty);
                let index = if has_blank { rows.len() - 1 } else { rows.len() };
                if !has_blank {
                    match list {
                        RowList::Params => draft.append_query_param(),
                        RowList::Headers => draft.append_header(),
                    }
                }
                (index, RowPatch::both(key, value))
            }
        };

        match list {
            RowList::Params => draft.update_query_param(index, &patch),
            RowList::Headers => draft.update_header(index, &patch),
        }
    }

    fn edit_body(&mut self, edit: BodyEdit, out: &mut String) {
        let draft = self.composer.draft_mut();
        match edit {
            BodyEdit::Set(text) => draft.set_body(text),
            BodyEdit::Clear => draft.set_body(""),
            BodyEdit::Format => match format_json(draft.body()) {
                Ok(pretty) => draft.set_body(pretty),
                Err(e) => {
                    let _ = writeln!(out, "{}", e);
                }
            },
        }
    }

    fn toggle(&mut self, collection_id: &str, open: bool, out: &mut String) {
        let workspace = self.composer.workspace_mut();
        if workspace.collection(collection_id).is_none() {
            let _ = writeln!(out, "No collection `{}`.", collection_id);
            return;
        }
        workspace.toggle_collection(collection_id, open);
    }

    /// Mirror a history change into the database; failures only get logged.
    fn persist<R>(&self, op: impl FnOnce(&Database) -> Result<R>) -> Option<R> {
        let db = self.db.as_ref()?;
        match op(db) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to save history: {:#}", e);
                None
            }
        }
    }
}
