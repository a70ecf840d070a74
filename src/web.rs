//! Read-only admin view over a populated cache.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Mutex, MutexGuard};

use actix_web::{App, HttpResponse, HttpServer, http, web};
use askama_escape::{Html, escape};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{Cache, Evidence, Interaction, Mirna, Target};
use crate::config::MIRTARBASE_VERSION;
use crate::error::MirtarbaseError;

const CARGO_NAME: &str = env!("CARGO_PKG_NAME");
const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");
pub const LANDING_TEMPLATE: &str = include_str!("templates/landing.html");
pub const TABLE_TEMPLATE: &str = include_str!("templates/table.html");
const STYLE_CSS: &str = include_str!("templates/style.css");

pub const PAGE_SIZE: i64 = 50;

pub fn render(template: &str, variables: HashMap<&str, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("[[{key}]]");
        result = result.replace(&placeholder, &value);
    }

    result
}

pub fn render_page(title: &str, content: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("title", escape(title, Html).to_string());
    vars.insert("css", STYLE_CSS.to_string());
    vars.insert("content", content.to_string());

    render(BASE_TEMPLATE, vars)
}

#[derive(Debug)]
pub struct WebError {
    err: MirtarbaseError,
}

impl Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn status_code(&self) -> http::StatusCode {
        match &self.err {
            MirtarbaseError::InvalidIdentifier(_) => http::StatusCode::BAD_REQUEST,
            MirtarbaseError::NotPopulated => http::StatusCode::NOT_FOUND,
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MirtarbaseError> for WebError {
    fn from(err: MirtarbaseError) -> Self {
        WebError { err }
    }
}

type WebResult = Result<HttpResponse, WebError>;

/// What the landing page reports about the cache.
#[derive(Debug, Clone)]
pub struct WebInfo {
    pub connection: String,
}

type SharedCache = web::Data<Mutex<Cache>>;

fn lock(cache: &SharedCache) -> Result<MutexGuard<'_, Cache>, WebError> {
    cache
        .lock()
        .map_err(|_| WebError::from(MirtarbaseError::Database("cache lock poisoned".to_string())))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
}

impl PageQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    fn offset(&self) -> Result<i64, WebError> {
        self.page().checked_mul(PAGE_SIZE).ok_or_else(|| {
            WebError::from(MirtarbaseError::InvalidIdentifier(format!(
                "page {} is out of range",
                self.page()
            )))
        })
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(http::header::ContentType(mime::TEXT_HTML_UTF_8))
        .body(body)
}

fn not_found(what: &str) -> HttpResponse {
    HttpResponse::NotFound()
        .insert_header(http::header::ContentType(mime::TEXT_PLAIN_UTF_8))
        .body(format!("{what} not found"))
}

fn cell(value: &str) -> String {
    format!("<td>{}</td>", escape(value, Html))
}

fn optional_cell(value: Option<&str>) -> String {
    cell(value.unwrap_or(""))
}

fn link_cell(href: &str, text: &str) -> String {
    format!(
        "<td><a href=\"{}\">{}</a></td>",
        escape(href, Html),
        escape(text, Html)
    )
}

fn header(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| format!("<th>{}</th>", escape(column, Html)))
        .collect()
}

fn pager(base: &str, page: i64, shown: usize) -> String {
    let mut links = Vec::new();
    if page > 0 {
        links.push(format!("<a href=\"{base}?page={}\">previous</a>", page - 1));
    }
    if shown as i64 == PAGE_SIZE {
        links.push(format!("<a href=\"{base}?page={}\">next</a>", page + 1));
    }
    links.join("")
}

fn table_page(heading: &str, intro: &str, columns: &[&str], rows: Vec<String>, pager: String) -> String {
    let mut vars = HashMap::new();
    vars.insert("heading", escape(heading, Html).to_string());
    vars.insert("intro", intro.to_string());
    vars.insert("header", header(columns));
    vars.insert(
        "rows",
        rows.into_iter()
            .map(|row| format!("<tr>{row}</tr>"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    vars.insert("pager", pager);
    render_page(heading, &render(TABLE_TEMPLATE, vars))
}

fn mirna_row(mirna: &Mirna) -> String {
    [
        link_cell(&format!("/mirna/{}", mirna.id), &mirna.mirtarbase_name),
        cell(&mirna.mirtarbase_identifier),
        optional_cell(mirna.mirbase_id.as_deref()),
        optional_cell(mirna.mirbase_name.as_deref()),
    ]
    .concat()
}

fn target_row(target: &Target) -> String {
    [
        link_cell(&format!("/target/{}", target.id), &target.gene_name),
        cell(&target.entrez_identifier),
        optional_cell(target.hgnc_symbol.as_deref()),
        optional_cell(target.hgnc_identifier.as_deref()),
    ]
    .concat()
}

fn interaction_row(interaction: &Interaction) -> String {
    [
        cell(&interaction.mirtarbase_identifier),
        link_cell(
            &format!("/mirna/{}", interaction.mirna_id),
            &interaction.mirna_id.to_string(),
        ),
        link_cell(
            &format!("/target/{}", interaction.target_id),
            &interaction.target_id.to_string(),
        ),
    ]
    .concat()
}

fn evidence_row(evidence: &Evidence) -> String {
    [
        cell(&evidence.interaction_id.to_string()),
        cell(&evidence.experiment),
        cell(&evidence.support),
        link_cell(
            &format!("https://pubmed.ncbi.nlm.nih.gov/{}/", evidence.reference),
            &evidence.reference,
        ),
    ]
    .concat()
}

const MIRNA_COLUMNS: &[&str] = &["Name", "Identifier", "miRBase", "miRBase name"];
const TARGET_COLUMNS: &[&str] = &["Gene", "Entrez", "HGNC symbol", "HGNC"];
const INTERACTION_COLUMNS: &[&str] = &["miRTarBase", "miRNA", "Target"];
const EVIDENCE_COLUMNS: &[&str] = &["Interaction", "Experiments", "Support", "PubMed"];

async fn landing(cache: SharedCache, info: web::Data<WebInfo>) -> WebResult {
    let summary = lock(&cache)?.summarize()?;
    let mut vars = HashMap::new();
    vars.insert("version", MIRTARBASE_VERSION.to_string());
    vars.insert("connection", escape(&info.connection, Html).to_string());
    vars.insert("mirnas", summary.mirnas.to_string());
    vars.insert("targets", summary.targets.to_string());
    vars.insert("species", summary.species.to_string());
    vars.insert("interactions", summary.interactions.to_string());
    vars.insert("evidences", summary.evidences.to_string());
    vars.insert("name", CARGO_NAME.to_string());
    vars.insert("crate_version", CARGO_VERSION.to_string());

    let content = render(LANDING_TEMPLATE, vars);
    Ok(html(render_page(
        &format!("miRTarBase {MIRTARBASE_VERSION}"),
        &content,
    )))
}

async fn mirnas(cache: SharedCache, query: web::Query<PageQuery>) -> WebResult {
    let offset = query.offset()?;
    let items = lock(&cache)?.list_mirnas(offset, PAGE_SIZE)?;
    let rows = items.iter().map(mirna_row).collect::<Vec<_>>();
    let pager = pager("/mirna", query.page(), rows.len());
    Ok(html(table_page("miRNAs", "", MIRNA_COLUMNS, rows, pager)))
}

async fn mirna_detail(cache: SharedCache, path: web::Path<i64>) -> WebResult {
    let cache = lock(&cache)?;
    let Some(mirna) = cache.mirna(path.into_inner())? else {
        return Ok(not_found("miRNA"));
    };
    let mut rows = Vec::new();
    for record in cache.mti_records_for_mirna(mirna.id)? {
        rows.push(
            [
                cell(&record.interaction.mirtarbase_identifier),
                link_cell(
                    &format!("/target/{}", record.target.id),
                    &record.target.gene_name,
                ),
                cell(&record.evidence.experiment),
                cell(&record.evidence.support),
                cell(&record.evidence.reference),
            ]
            .concat(),
        );
    }
    let intro = format!("<table><tbody><tr>{}</tr></tbody></table>", mirna_row(&mirna));
    Ok(html(table_page(
        &mirna.mirtarbase_name,
        &intro,
        &["miRTarBase", "Target", "Experiments", "Support", "PubMed"],
        rows,
        String::new(),
    )))
}

async fn targets(cache: SharedCache, query: web::Query<PageQuery>) -> WebResult {
    let offset = query.offset()?;
    let items = lock(&cache)?.list_targets(offset, PAGE_SIZE)?;
    let rows = items.iter().map(target_row).collect::<Vec<_>>();
    let pager = pager("/target", query.page(), rows.len());
    Ok(html(table_page("Targets", "", TARGET_COLUMNS, rows, pager)))
}

async fn target_detail(cache: SharedCache, path: web::Path<i64>) -> WebResult {
    let cache = lock(&cache)?;
    let Some(target) = cache.target(path.into_inner())? else {
        return Ok(not_found("target"));
    };
    let mut rows = Vec::new();
    for record in cache.mti_records_for_target(target.id)? {
        rows.push(
            [
                cell(&record.interaction.mirtarbase_identifier),
                link_cell(
                    &format!("/mirna/{}", record.mirna.id),
                    &record.mirna.mirtarbase_name,
                ),
                cell(&record.evidence.experiment),
                cell(&record.evidence.support),
                cell(&record.evidence.reference),
            ]
            .concat(),
        );
    }
    let intro = format!("<table><tbody><tr>{}</tr></tbody></table>", target_row(&target));
    Ok(html(table_page(
        &target.gene_name,
        &intro,
        &["miRTarBase", "miRNA", "Experiments", "Support", "PubMed"],
        rows,
        String::new(),
    )))
}

async fn species(cache: SharedCache) -> WebResult {
    let items = lock(&cache)?.list_species()?;
    let rows = items
        .iter()
        .map(|species| {
            [
                cell(&species.name),
                optional_cell(species.taxonomy_id.as_deref()),
            ]
            .concat()
        })
        .collect::<Vec<_>>();
    Ok(html(table_page(
        "Species",
        "",
        &["Name", "Taxonomy"],
        rows,
        String::new(),
    )))
}

async fn interactions(cache: SharedCache, query: web::Query<PageQuery>) -> WebResult {
    let offset = query.offset()?;
    let items = lock(&cache)?.list_interactions(offset, PAGE_SIZE)?;
    let rows = items.iter().map(interaction_row).collect::<Vec<_>>();
    let pager = pager("/interaction", query.page(), rows.len());
    Ok(html(table_page(
        "Interactions",
        "",
        INTERACTION_COLUMNS,
        rows,
        pager,
    )))
}

async fn evidences(cache: SharedCache, query: web::Query<PageQuery>) -> WebResult {
    let offset = query.offset()?;
    let items = lock(&cache)?.list_evidences(offset, PAGE_SIZE)?;
    let rows = items.iter().map(evidence_row).collect::<Vec<_>>();
    let pager = pager("/evidence", query.page(), rows.len());
    Ok(html(table_page("Evidence", "", EVIDENCE_COLUMNS, rows, pager)))
}

async fn api_summary(cache: SharedCache) -> WebResult {
    let summary = lock(&cache)?.summarize()?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Serialize)]
struct TargetView {
    #[serde(flatten)]
    target: Target,
    interactions: Vec<InteractionView>,
}

#[derive(Serialize)]
struct InteractionView {
    mirtarbase_identifier: String,
    mirna: String,
    evidences: Vec<Evidence>,
}

async fn api_target(cache: SharedCache, path: web::Path<String>) -> WebResult {
    let cache = lock(&cache)?;
    let Some(target) = cache.find_target_by_entrez(&path)? else {
        return Ok(not_found("target"));
    };
    let mut interactions = Vec::new();
    for interaction in cache.interactions_for_target(target.id)? {
        let mirna = cache
            .mirna(interaction.mirna_id)?
            .map(|mirna| mirna.mirtarbase_name)
            .unwrap_or_default();
        interactions.push(InteractionView {
            evidences: cache.evidences_for_interaction(interaction.id)?,
            mirtarbase_identifier: interaction.mirtarbase_identifier,
            mirna,
        });
    }
    Ok(HttpResponse::Ok().json(TargetView {
        target,
        interactions,
    }))
}

async fn api_interaction(cache: SharedCache, path: web::Path<String>) -> WebResult {
    let cache = lock(&cache)?;
    match cache.find_mirna_by_interaction(&path)? {
        Some(mirna) => Ok(HttpResponse::Ok().json(mirna)),
        None => Ok(not_found("interaction")),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(landing))
        .route("/mirna", web::get().to(mirnas))
        .route("/mirna/{id}", web::get().to(mirna_detail))
        .route("/target", web::get().to(targets))
        .route("/target/{id}", web::get().to(target_detail))
        .route("/species", web::get().to(species))
        .route("/interaction", web::get().to(interactions))
        .route("/evidence", web::get().to(evidences))
        .route("/api/summary", web::get().to(api_summary))
        .route("/api/target/{entrez}", web::get().to(api_target))
        .route("/api/interaction/{mirtarbase_id}", web::get().to(api_interaction));
}

/// Serves the admin view until interrupted.
pub fn serve(cache: Cache, connection: String, host: &str, port: u16) -> Result<(), MirtarbaseError> {
    let cache = web::Data::new(Mutex::new(cache));
    let info = web::Data::new(WebInfo { connection });
    let bind = format!("{host}:{port}");
    info!(%bind, "serving admin view");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(cache.clone())
                .app_data(info.clone())
                .configure(configure)
        })
        .bind(bind.as_str())
        .map_err(|err| MirtarbaseError::Filesystem(format!("bind {bind}: {err}")))?
        .run()
        .await
        .map_err(|err| MirtarbaseError::Filesystem(format!("server: {err}")))
    })
}
