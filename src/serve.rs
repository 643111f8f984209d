//! HTTP server for the browser tree editor
//!
//! `logictree serve` → starts server, prints the URL, edits `.logictree/tree.json`

use std::sync::Arc;

use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::ai::{self, AiError, ExpandMode, GeminiClient, IdeaSource};
use crate::config::Config;
use crate::csv_io::{self, CsvOptions};
use crate::export::{self, ExportFormat, ExportOptions};
use crate::store::{StoreError, TreeStore};
use crate::tree::{Direction, DropPosition, LogicTree, NodeId, NodeOrigin, TreeError};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// Single-file editor, no build step
const EDITOR_HTML: &str = include_str!("editor.html");

/// What the handlers need: where the tree lives and how to get ideas
#[derive(Clone)]
pub struct ServerContext {
    pub store: TreeStore,
    pub config: Config,
    /// Fixed idea source; `None` builds a Gemini client per request
    pub ideas: Option<Arc<dyn IdeaSource>>,
}

impl ServerContext {
    pub fn new(store: TreeStore, config: Config) -> Self {
        Self {
            store,
            config,
            ideas: None,
        }
    }

    pub fn with_ideas(mut self, ideas: Arc<dyn IdeaSource>) -> Self {
        self.ideas = Some(ideas);
        self
    }

    fn idea_source(&self) -> Result<Arc<dyn IdeaSource>, AiError> {
        match &self.ideas {
            Some(source) => Ok(Arc::clone(source)),
            None => Ok(Arc::new(GeminiClient::from_config(&self.config.ai)?)),
        }
    }
}

/// A recognised request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Editor,
    GetTree,
    AddChild(NodeId),
    EditNode(NodeId),
    DeleteNode(NodeId),
    MoveNode(NodeId),
    ReorderNode(NodeId),
    ExpandNode(NodeId),
    Export,
    Import,
    NotFound,
}

impl Route {
    pub fn parse(method: &Method, path: &str) -> Self {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, [""]) | (Method::Get, ["index.html"]) => Route::Editor,
            (Method::Get, ["api", "tree"]) => Route::GetTree,
            (Method::Get, ["api", "export"]) => Route::Export,
            (Method::Post, ["api", "import"]) => Route::Import,
            (Method::Put, ["api", "nodes", id]) => Route::EditNode(decode_segment(id)),
            (Method::Delete, ["api", "nodes", id]) => Route::DeleteNode(decode_segment(id)),
            (Method::Post, ["api", "nodes", id, action]) => {
                let id = decode_segment(id);
                match *action {
                    "children" => Route::AddChild(id),
                    "move" => Route::MoveNode(id),
                    "reorder" => Route::ReorderNode(id),
                    "expand" => Route::ExpandNode(id),
                    _ => Route::NotFound,
                }
            }
            _ => Route::NotFound,
        }
    }
}

/// Percent-decode one path segment
fn decode_segment(segment: &str) -> NodeId {
    // encodeURIComponent output is valid form encoding once '+' is escaped
    let escaped = segment.replace('+', "%2B");
    let decoded = serde_urlencoded::from_str::<Vec<(String, String)>>(&format!("id={}", escaped))
        .ok()
        .and_then(|mut pairs| pairs.pop())
        .map(|(_, value)| value)
        .unwrap_or_else(|| segment.to_string());
    NodeId::from(decoded)
}

/// A finished response, independent of the HTTP library
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Suggested download name (`Content-Disposition`)
    pub filename: Option<String>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            format!("{{\"ok\":false,\"data\":null,\"error\":\"serialization failed: {}\"}}", e)
        });
        Self {
            status,
            content_type: "application/json",
            body,
            filename: None,
        }
    }

    fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &ApiResponse::success(data))
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &ApiResponse::failure(message))
    }

    fn from_error(err: &crate::Error) -> Self {
        Self::error(status_for(err), err.to_string())
    }
}

/// HTTP status for a failed operation
pub fn status_for(err: &crate::Error) -> u16 {
    match err {
        crate::Error::Tree(TreeError::NodeNotFound(_)) => 404,
        crate::Error::Tree(_) | crate::Error::Csv(_) | crate::Error::Json(_) => 400,
        crate::Error::Ai(_) => 502,
        crate::Error::Store(StoreError::NotFound(_)) => 404,
        crate::Error::Store(StoreError::InvalidTree(_)) => 400,
        crate::Error::Store(_) | crate::Error::Io(_) => 500,
    }
}

/// Tree after a mutation, plus any ids it created
#[derive(Debug, Serialize)]
struct Changed {
    tree: LogicTree,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ids: Vec<NodeId>,
}

#[derive(Debug, Default, Deserialize)]
struct AddChildRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    target: NodeId,
    #[serde(default)]
    position: DropPosition,
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    direction: Direction,
}

#[derive(Debug, Default, Deserialize)]
struct ExpandRequest {
    #[serde(default)]
    mode: ExpandMode,
}

#[derive(Debug, Default, Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    bom: bool,
    #[serde(default)]
    root: Option<String>,
}

/// Parse a JSON body; an empty body means "all defaults"
fn parse_body<T: DeserializeOwned + Default>(body: &str) -> crate::Result<T> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}

/// Run one request against the store
pub fn dispatch(ctx: &ServerContext, route: &Route, body: &str, query: &str) -> Reply {
    let result = match route {
        Route::Editor => {
            return Reply {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: EDITOR_HTML.to_string(),
                filename: None,
            }
        }
        Route::NotFound => return Reply::error(404, "not found"),
        Route::Export => return export_tree(ctx, query),
        Route::GetTree => ctx.store.load().map(Reply::ok).map_err(crate::Error::from),
        Route::AddChild(id) => add_child(ctx, id, body),
        Route::EditNode(id) => edit_node(ctx, id, body),
        Route::DeleteNode(id) => mutate(ctx, |tree| {
            tree.delete(id)?;
            Ok(Vec::new())
        }),
        Route::MoveNode(id) => serde_json::from_str::<MoveRequest>(body)
            .map_err(crate::Error::from)
            .and_then(|req| {
                mutate(ctx, |tree| {
                    tree.move_node(id, &req.target, req.position)?;
                    Ok(Vec::new())
                })
            }),
        Route::ReorderNode(id) => serde_json::from_str::<ReorderRequest>(body)
            .map_err(crate::Error::from)
            .and_then(|req| {
                mutate(ctx, |tree| {
                    tree.reorder(id, req.direction)?;
                    Ok(Vec::new())
                })
            }),
        Route::ExpandNode(id) => expand(ctx, id, body),
        Route::Import => import_csv(ctx, body),
    };

    result.unwrap_or_else(|err| {
        tracing::warn!(?route, error = %err, "request failed");
        Reply::from_error(&err)
    })
}

fn mutate<F>(ctx: &ServerContext, f: F) -> crate::Result<Reply>
where
    F: FnOnce(&mut LogicTree) -> crate::Result<Vec<NodeId>>,
{
    let (tree, ids) = ctx.store.update(|tree| {
        let ids = f(tree)?;
        Ok::<_, crate::Error>((tree.clone(), ids))
    })?;
    Ok(Reply::ok(Changed { tree, ids }))
}

fn add_child(ctx: &ServerContext, id: &NodeId, body: &str) -> crate::Result<Reply> {
    let req: AddChildRequest = parse_body(body)?;
    let text = req
        .text
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| ctx.config.tree.new_node_text.clone());
    mutate(ctx, |tree| Ok(vec![tree.add_child(id, &text, NodeOrigin::Manual)?]))
}

fn edit_node(ctx: &ServerContext, id: &NodeId, body: &str) -> crate::Result<Reply> {
    let req: EditRequest = serde_json::from_str(body)?;
    mutate(ctx, |tree| {
        tree.edit_text(id, &req.text)?;
        Ok(Vec::new())
    })
}

fn expand(ctx: &ServerContext, id: &NodeId, body: &str) -> crate::Result<Reply> {
    let req: ExpandRequest = parse_body(body)?;
    let source = ctx.idea_source()?;
    mutate(ctx, |tree| ai::expand_node(tree, id, source.as_ref(), req.mode))
}

fn import_csv(ctx: &ServerContext, body: &str) -> crate::Result<Reply> {
    let tree = csv_io::tree_from_csv(body)?;
    ctx.store.save(&tree)?;
    tracing::info!(nodes = tree.node_count(), "imported tree over HTTP");
    Ok(Reply::ok(Changed { tree, ids: Vec::new() }))
}

fn export_tree(ctx: &ServerContext, query: &str) -> Reply {
    let query: ExportQuery = match serde_urlencoded::from_str(query) {
        Ok(q) => q,
        Err(e) => return Reply::error(400, format!("invalid query: {}", e)),
    };
    let format = match query.format.as_deref().unwrap_or("csv").parse::<ExportFormat>() {
        Ok(f) => f,
        Err(e) => return Reply::error(400, e),
    };
    let options = ExportOptions {
        csv: CsvOptions { bom: query.bom },
        root: query.root.map(NodeId::from),
        ..ExportOptions::default()
    };

    let rendered = ctx
        .store
        .load()
        .map_err(crate::Error::from)
        .and_then(|tree| export::render(&tree, format, &options));

    match rendered {
        Ok(body) => Reply {
            status: 200,
            content_type: format.content_type(),
            body,
            filename: Some(format!("logictree.{}", format.extension())),
        },
        Err(err) => Reply::from_error(&err),
    }
}

/// Start the editor server and block forever
pub fn start_server(ctx: ServerContext, port: u16) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n{}", "🌳 LogicTree".green().bold());
    eprintln!("   Editor: {}", url);
    eprintln!("   Tree:   {}", ctx.store.path().display());
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&ctx, request) {
            eprintln!("{} {}", "Error:".red(), e);
        }
    }

    Ok(())
}

fn handle_request(ctx: &ServerContext, mut request: Request) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let method = request.method().clone();

    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        let reply = Reply::error(400, format!("Failed to read body: {}", e));
        return respond(request, reply);
    }

    let route = Route::parse(&method, path);
    let reply = dispatch(ctx, &route, &body, query);
    tracing::info!(%method, path, status = reply.status, "request");
    respond(request, reply)
}

fn respond(request: Request, reply: Reply) -> std::io::Result<()> {
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    if let Some(name) = reply.filename {
        let value = format!("attachment; filename=\"{}\"", name);
        if let Ok(header) = Header::from_bytes(&b"Content-Disposition"[..], value.as_bytes()) {
            response = response.with_header(header);
        }
    }
    request.respond(response)
}
