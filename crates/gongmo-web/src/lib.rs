//! Axum + Askama web UI for Gongmo: the main dashboard and the admin shell.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Path as AxumPath, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{Local, NaiveDate};
use gongmo_assist::{
    to_word_document, ChatAssistant, CrawlRefresher, ProposalDesk, ProposalRequest, Role,
    PROJECT_TYPES, QUICK_PROMPTS,
};
use gongmo_catalog::{Catalog, Settings};
use gongmo_core::{CategoryFilter, DateField, Listing, ListTab, SortOrder, Theme};
use gongmo_query::{filter_employees, ListingFilter, ListingQuery, Pager, Projection, QueryState};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const CRATE_NAME: &str = "gongmo-web";

const THEME_COOKIE: &str = "theme";

/// Process settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub port: u16,
    pub admin_port: u16,
    pub main_app_url: String,
    pub default_theme: Theme,
    /// Pins "today" for the recruiting/closed split; wall clock when unset.
    pub today: Option<NaiveDate>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            admin_port: 3001,
            main_app_url: "http://localhost:3000".to_string(),
            default_theme: Theme::Light,
            today: None,
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("GONGMO_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            admin_port: std::env::var("GONGMO_ADMIN_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.admin_port),
            main_app_url: std::env::var("GONGMO_MAIN_APP_URL").unwrap_or(defaults.main_app_url),
            default_theme: std::env::var("GONGMO_THEME")
                .ok()
                .and_then(|v| Theme::from_param(&v))
                .unwrap_or(defaults.default_theme),
            today: std::env::var("GONGMO_TODAY")
                .ok()
                .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub workspace_root: PathBuf,
    pub settings: Settings,
    pub catalog: Catalog,
    pub config: WebConfig,
    pub chat: ChatAssistant,
    pub proposals: ProposalDesk,
    pub refresher: CrawlRefresher,
}

impl AppState {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        settings: Settings,
        catalog: Catalog,
        config: WebConfig,
    ) -> Self {
        let delays = &settings.assist;
        Self {
            workspace_root: workspace_root.into(),
            chat: ChatAssistant::new(Duration::from_millis(delays.reply_delay_ms)),
            proposals: ProposalDesk::new(Duration::from_millis(delays.proposal_delay_ms)),
            refresher: CrawlRefresher::new(Duration::from_millis(delays.refresh_delay_ms)),
            settings,
            catalog,
            config,
        }
    }

    /// Reads `gongmo.yaml` and the catalog for `workspace_root`.
    pub fn load(workspace_root: impl Into<PathBuf>, config: WebConfig) -> anyhow::Result<Self> {
        let workspace_root = workspace_root.into();
        let settings = Settings::load(&workspace_root).context("loading settings")?;
        let catalog = Catalog::load(&settings, &workspace_root).context("loading catalog")?;
        Ok(Self::new(workspace_root, settings, catalog, config))
    }

    fn today(&self) -> NaiveDate {
        self.config.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn theme(&self, headers: &HeaderMap) -> Theme {
        theme_from_cookies(headers).unwrap_or(self.config.default_theme)
    }
}

// ---------------------------------------------------------------------------
// View models

#[derive(Debug, Clone)]
struct MenuItem {
    path: &'static str,
    label: &'static str,
    active: bool,
}

const MENU: [(&str, &str); 5] = [
    ("/dashboard", "대시보드"),
    ("/projects", "공모사업"),
    ("/proposal", "제안서 작성"),
    ("/ai-human", "AI 휴먼"),
    ("/hr", "HR"),
];

/// Shared chrome: theme and sidebar state, passed explicitly into every page.
#[derive(Debug, Clone)]
struct Layout {
    theme: &'static str,
    toggle_label: &'static str,
    current_path: &'static str,
    menu: Vec<MenuItem>,
}

impl Layout {
    fn new(theme: Theme, current_path: &'static str) -> Self {
        Self {
            theme: theme.as_str(),
            toggle_label: match theme {
                Theme::Light => "다크 모드",
                Theme::Dark => "라이트 모드",
            },
            current_path,
            menu: MENU
                .iter()
                .map(|&(path, label)| MenuItem {
                    path,
                    label,
                    active: path == current_path,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct LinkView {
    label: String,
    href: String,
    active: bool,
}

#[derive(Debug, Clone)]
struct OptionView {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Debug, Clone)]
struct ListingRow {
    id: u32,
    badge: String,
    source_key: String,
    source: String,
    status: &'static str,
    status_label: &'static str,
    title: String,
    category: String,
    period: String,
    amount: String,
    collected_at: String,
    info_collected_at: String,
    has_url: bool,
}

impl ListingRow {
    fn from_listing(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            badge: listing.source_badge(),
            source_key: listing.source_key(),
            source: listing.source.clone(),
            status: listing.status.as_str(),
            status_label: listing.status.label(),
            title: listing.title.clone(),
            category: listing.category.clone(),
            period: format!("{} ~ {}", listing.start_date, listing.deadline),
            amount: listing.amount.clone(),
            collected_at: listing.collected_at_display(),
            info_collected_at: listing.info_collected_at.clone(),
            has_url: listing.url.is_some(),
        }
    }
}

#[derive(Debug, Clone)]
struct PageLink {
    number: usize,
    href: String,
    current: bool,
}

#[derive(Debug, Clone)]
struct PagerView {
    visible: bool,
    can_go_back: bool,
    can_go_forward: bool,
    jump_back_href: String,
    prev_href: String,
    next_href: String,
    jump_forward_href: String,
    pages: Vec<PageLink>,
}

#[derive(Debug, Clone)]
struct ProjectsView {
    rows: Vec<ListingRow>,
    total_items: usize,
    tabs: Vec<LinkView>,
    sort_fields: Vec<LinkView>,
    sort_order_label: &'static str,
    sort_order_href: String,
    ascending: bool,
    pager: PagerView,
    search_text: String,
    categories: Vec<OptionView>,
    date_fields: Vec<OptionView>,
    date_from: String,
    date_to: String,
    tab: &'static str,
    sort_field: &'static str,
    sort_order: &'static str,
    current_query: String,
    last_crawled: String,
    refreshing: bool,
}

#[derive(Debug, Clone)]
struct MessageView {
    from_user: bool,
    content: String,
    timestamp: String,
}

#[derive(Debug, Clone)]
struct QuickLink {
    path: &'static str,
    label: &'static str,
    description: &'static str,
}

const QUICK_LINKS: [QuickLink; 3] = [
    QuickLink {
        path: "/projects",
        label: "공모사업",
        description: "공모사업 크롤링 및 현황",
    },
    QuickLink {
        path: "/proposal",
        label: "제안서 작성",
        description: "AI 기반 제안서 생성",
    },
    QuickLink {
        path: "/ai-human",
        label: "AI 휴먼",
        description: "AI 어시스턴트와 대화",
    },
];

#[derive(Debug, Clone)]
struct EmployeeRow {
    name: String,
    department: String,
    position: String,
    present: bool,
    presence_label: &'static str,
    attendance: String,
}

// ---------------------------------------------------------------------------
// Templates

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    layout: Layout,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    layout: Layout,
    cards: Vec<gongmo_core::StatCard>,
    quick_links: Vec<QuickLink>,
}

#[derive(Template)]
#[template(path = "projects.html")]
struct ProjectsPageTemplate {
    layout: Layout,
    view: ProjectsView,
}

#[derive(Template)]
#[template(path = "projects_view.html")]
struct ProjectsViewPartialTemplate {
    view: ProjectsView,
}

#[derive(Template)]
#[template(path = "ai_human.html")]
struct AiHumanTemplate {
    layout: Layout,
    messages: Vec<MessageView>,
    thinking: bool,
    quick_prompts: Vec<&'static str>,
    draft: String,
}

#[derive(Template)]
#[template(path = "proposal.html")]
struct ProposalTemplate {
    layout: Layout,
    request: ProposalRequest,
    project_types: Vec<OptionView>,
    generating: bool,
    generated: String,
    has_generated: bool,
}

#[derive(Template)]
#[template(path = "hr.html")]
struct HrTemplate {
    layout: Layout,
    stats: Vec<gongmo_core::StatCard>,
    attendance: Vec<gongmo_core::AttendancePoint>,
    employees: Vec<EmployeeRow>,
    search: String,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    main_app_url: String,
}

// ---------------------------------------------------------------------------
// Routers

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/projects", get(projects_page_handler))
        .route("/projects/table", get(projects_table_handler))
        .route("/projects/refresh", post(projects_refresh_handler))
        .route("/projects/{id}/open", get(listing_open_handler))
        .route("/api/listings", get(listings_api_handler))
        .route("/ai-human", get(ai_human_handler).post(ai_human_send_handler))
        .route("/ai-human/reset", post(ai_human_reset_handler))
        .route("/proposal", get(proposal_handler).post(proposal_generate_handler))
        .route("/proposal/export", get(proposal_export_handler))
        .route("/hr", get(hr_handler))
        .route("/theme", post(theme_toggle_handler))
        .route("/assets/static/app.css", get(app_css_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// The admin shell: a single page linking out to the main app.
pub fn admin_app(config: WebConfig) -> Router {
    Router::new()
        .route("/", get(admin_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let port = state.config.port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!(addr = %listener.local_addr()?, "serving main app");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

pub async fn serve_admin(config: WebConfig) -> anyhow::Result<()> {
    let port = config.admin_port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!(addr = %listener.local_addr()?, main_app_url = %config.main_app_url, "serving admin shell");
    axum::serve(listener, admin_app(config)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers

async fn landing_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    render_html(LandingTemplate {
        layout: Layout::new(state.theme(&headers), "/"),
    })
}

async fn dashboard_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    render_html(DashboardTemplate {
        layout: Layout::new(state.theme(&headers), "/dashboard"),
        cards: state.catalog.overview().summary_cards.clone(),
        quick_links: QUICK_LINKS.to_vec(),
    })
}

/// Query-string form of the listing view. Values are parsed leniently; anything
/// unrecognised falls back to the default.
#[derive(Debug, Deserialize, Default)]
struct ProjectsParams {
    q: Option<String>,
    date_field: Option<String>,
    from: Option<String>,
    to: Option<String>,
    category: Option<String>,
    tab: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    page: Option<String>,
    /// Present when the search form was submitted.
    commit: Option<String>,
}

impl ProjectsParams {
    fn filter(&self) -> ListingFilter {
        ListingFilter {
            search_text: self.q.clone().unwrap_or_default(),
            date_field: self
                .date_field
                .as_deref()
                .and_then(DateField::from_param)
                .unwrap_or_default(),
            date_from: ListingFilter::date_bound(self.from.as_deref()),
            date_to: ListingFilter::date_bound(self.to.as_deref()),
            category: CategoryFilter::from_label(self.category.as_deref().unwrap_or_default()),
        }
    }

    /// Links carry the applied filter; a form submission carries a draft that
    /// is committed here, which also sends the view back to page 1.
    fn to_state(&self) -> QueryState {
        let mut query = ListingQuery {
            tab: self.tab.as_deref().and_then(ListTab::from_param).unwrap_or_default(),
            sort_field: self.sort.as_deref().and_then(DateField::from_param).unwrap_or_default(),
            sort_order: self.order.as_deref().and_then(SortOrder::from_param).unwrap_or_default(),
            page: self.page.as_deref().and_then(|p| p.trim().parse().ok()).unwrap_or(1),
            ..ListingQuery::default()
        };
        if self.commit.is_none() {
            query.filter = self.filter();
            return QueryState::from_query(query);
        }
        let mut state = QueryState::from_query(query);
        *state.draft_mut() = self.filter();
        state.commit();
        state
    }
}

fn projects_href(state: &QueryState) -> String {
    let filter = state.applied();
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if !filter.search_text.is_empty() {
        pairs.push(("q", filter.search_text.clone()));
    }
    if let CategoryFilter::Only(category) = &filter.category {
        pairs.push(("category", category.clone()));
    }
    pairs.push(("date_field", filter.date_field.as_param().to_string()));
    if let Some(from) = &filter.date_from {
        pairs.push(("from", from.clone()));
    }
    if let Some(to) = &filter.date_to {
        pairs.push(("to", to.clone()));
    }
    pairs.push(("tab", state.tab().as_param().to_string()));
    pairs.push(("sort", state.sort_field().as_param().to_string()));
    pairs.push(("order", state.sort_order().as_param().to_string()));
    pairs.push(("page", state.page().to_string()));
    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/projects?{query}")
}

fn href_with(state: &QueryState, change: impl FnOnce(&mut QueryState)) -> String {
    let mut next = state.clone();
    change(&mut next);
    projects_href(&next)
}

fn pager_view(state: &QueryState, projection: &Projection) -> PagerView {
    let pager = Pager::for_projection(projection);
    let total = pager.total_pages;
    let goto = |page: usize| href_with(state, |s| s.go_to_page(page, total));
    PagerView {
        visible: pager.is_visible(),
        can_go_back: pager.can_go_back(),
        can_go_forward: pager.can_go_forward(),
        jump_back_href: goto(pager.jump_back()),
        prev_href: goto(pager.prev()),
        next_href: goto(pager.next()),
        jump_forward_href: goto(pager.jump_forward()),
        pages: pager
            .pages()
            .map(|number| PageLink {
                number,
                href: goto(number),
                current: number == pager.current,
            })
            .collect(),
    }
}

fn projects_view(state: &AppState, params: &ProjectsParams) -> ProjectsView {
    let mut query_state = params.to_state();
    let projection = query_state.project(
        state.catalog.listings(),
        state.settings.page_size,
        state.today(),
    );
    // Keep links consistent with the page actually shown after clamping.
    query_state.go_to_page(projection.page, projection.total_pages);

    let applied = query_state.applied();
    let tabs = [ListTab::Recruiting, ListTab::Closed]
        .into_iter()
        .map(|tab| LinkView {
            label: tab.label().to_string(),
            href: href_with(&query_state, |s| s.set_tab(tab)),
            active: tab == query_state.tab(),
        })
        .collect();
    let sort_fields = DateField::ALL
        .into_iter()
        .map(|field| LinkView {
            label: field.label().to_string(),
            href: href_with(&query_state, |s| s.set_sort_field(field)),
            active: field == query_state.sort_field(),
        })
        .collect();
    let categories = state
        .settings
        .categories
        .iter()
        .map(|category| OptionView {
            value: category.clone(),
            label: category.clone(),
            selected: applied.category.label() == category,
        })
        .collect();
    let date_fields = DateField::ALL
        .into_iter()
        .map(|field| OptionView {
            value: field.as_param().to_string(),
            label: field.label().to_string(),
            selected: field == applied.date_field,
        })
        .collect();
    let current_href = projects_href(&query_state);

    ProjectsView {
        rows: projection.items.iter().map(ListingRow::from_listing).collect(),
        total_items: projection.total_items,
        tabs,
        sort_fields,
        sort_order_label: query_state.sort_order().label(),
        sort_order_href: href_with(&query_state, QueryState::toggle_sort_order),
        ascending: query_state.sort_order() == SortOrder::Ascending,
        pager: pager_view(&query_state, &projection),
        search_text: applied.search_text.clone(),
        categories,
        date_fields,
        date_from: applied.date_from.clone().unwrap_or_default(),
        date_to: applied.date_to.clone().unwrap_or_default(),
        tab: query_state.tab().as_param(),
        sort_field: query_state.sort_field().as_param(),
        sort_order: query_state.sort_order().as_param(),
        current_query: current_href.trim_start_matches("/projects?").to_string(),
        last_crawled: state.refresher.last_crawled_label(),
        refreshing: state.refresher.is_refreshing(),
    }
}

async fn projects_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ProjectsParams>,
) -> Response {
    render_html(ProjectsPageTemplate {
        layout: Layout::new(state.theme(&headers), "/projects"),
        view: projects_view(&state, &params),
    })
}

async fn projects_table_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectsParams>,
) -> Response {
    let mut resp = render_html(ProjectsViewPartialTemplate {
        view: projects_view(&state, &params),
    });
    resp.headers_mut().insert(
        header::HeaderName::from_static("hx-trigger"),
        header::HeaderValue::from_static("projectsTableLoaded"),
    );
    resp
}

async fn projects_refresh_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    if !state.refresher.refresh() {
        info!("refresh already running; ignoring");
    }
    let back = match query {
        Some(q) if !q.is_empty() => format!("/projects?{q}"),
        _ => "/projects".to_string(),
    };
    Redirect::to(&back).into_response()
}

async fn listing_open_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<u32>,
) -> Response {
    match state.catalog.listing(id) {
        Some(listing) => match &listing.url {
            Some(url) => Redirect::to(url).into_response(),
            None => Redirect::to("/projects").into_response(),
        },
        None => (StatusCode::NOT_FOUND, Html("Listing not found".to_string())).into_response(),
    }
}

async fn listings_api_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectsParams>,
) -> Response {
    let projection = params.to_state().project(
        state.catalog.listings(),
        state.settings.page_size,
        state.today(),
    );
    Json(projection).into_response()
}

async fn ai_human_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let messages = state
        .chat
        .messages()
        .into_iter()
        .map(|m| MessageView {
            from_user: m.role == Role::User,
            content: m.content,
            timestamp: m.timestamp,
        })
        .collect();
    render_html(AiHumanTemplate {
        layout: Layout::new(state.theme(&headers), "/ai-human"),
        messages,
        thinking: state.chat.is_thinking(),
        quick_prompts: QUICK_PROMPTS.to_vec(),
        draft: String::new(),
    })
}

#[derive(Debug, Deserialize, Default)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

async fn ai_human_send_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChatForm>,
) -> Response {
    state.chat.send(&form.message);
    Redirect::to("/ai-human").into_response()
}

async fn ai_human_reset_handler(State(state): State<Arc<AppState>>) -> Response {
    state.chat.reset();
    Redirect::to("/ai-human").into_response()
}

async fn proposal_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let request = state.proposals.last_request();
    let generated = state.proposals.generated();
    let project_types = PROJECT_TYPES
        .iter()
        .map(|t| OptionView {
            value: t.to_string(),
            label: t.to_string(),
            selected: request.project_type == *t,
        })
        .collect();
    render_html(ProposalTemplate {
        layout: Layout::new(state.theme(&headers), "/proposal"),
        request,
        project_types,
        generating: state.proposals.is_generating(),
        has_generated: generated.is_some(),
        generated: generated.map(|g| g.markdown).unwrap_or_default(),
    })
}

async fn proposal_generate_handler(
    State(state): State<Arc<AppState>>,
    Form(request): Form<ProposalRequest>,
) -> Response {
    state.proposals.generate(request);
    Redirect::to("/proposal").into_response()
}

async fn proposal_export_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(generated) = state.proposals.generated() else {
        return (StatusCode::NOT_FOUND, Html("No proposal generated yet".to_string())).into_response();
    };
    (
        [
            (header::CONTENT_TYPE, "application/msword".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", generated.file_name()),
            ),
        ],
        to_word_document(&generated.markdown),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Default)]
struct HrParams {
    q: Option<String>,
}

async fn hr_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HrParams>,
) -> Response {
    let search = params.q.unwrap_or_default();
    let employees = filter_employees(state.catalog.employees(), &search)
        .into_iter()
        .map(|e| EmployeeRow {
            name: e.name.clone(),
            department: e.department.clone(),
            position: e.position.clone(),
            present: e.presence == gongmo_core::Presence::Present,
            presence_label: e.presence.label(),
            attendance: e.attendance.clone(),
        })
        .collect();
    let overview = state.catalog.overview();
    render_html(HrTemplate {
        layout: Layout::new(state.theme(&headers), "/hr"),
        stats: overview.hr_stats.clone(),
        attendance: overview.attendance.clone(),
        employees,
        search,
    })
}

#[derive(Debug, Deserialize, Default)]
struct ThemeForm {
    back: Option<String>,
}

async fn theme_toggle_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ThemeForm>,
) -> Response {
    let next = state.theme(&headers).toggled();
    let back = form
        .back
        .filter(|b| b.starts_with('/') && !b.starts_with("//"))
        .unwrap_or_else(|| "/".to_string());
    (
        [(
            header::SET_COOKIE,
            format!("{THEME_COOKIE}={}; Path=/; SameSite=Lax", next.as_str()),
        )],
        Redirect::to(&back),
    )
        .into_response()
}

async fn app_css_handler(State(state): State<Arc<AppState>>) -> Response {
    let css_path = state.workspace_root.join("assets/static/app.css");
    match tokio::fs::read_to_string(&css_path).await {
        Ok(css) => ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response(),
        Err(err) => {
            warn!(path = %css_path.display(), %err, "stylesheet missing");
            (StatusCode::NOT_FOUND, Html("/* missing app.css */".to_string())).into_response()
        }
    }
}

async fn admin_handler(State(config): State<Arc<WebConfig>>) -> Response {
    render_html(AdminTemplate {
        main_app_url: config.main_app_url.clone(),
    })
}

// ---------------------------------------------------------------------------
// Helpers

fn theme_from_cookies(headers: &HeaderMap) -> Option<Theme> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == THEME_COOKIE)
        .and_then(|(_, value)| Theme::from_param(value))
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn server_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {}", err)),
    )
        .into_response()
}

/// Workspace root relative to this crate, for tests and `cargo run` defaults.
pub fn default_workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut settings = Settings::default();
        settings.assist.reply_delay_ms = 10;
        settings.assist.proposal_delay_ms = 10;
        settings.assist.refresh_delay_ms = 10;
        AppState::new(
            default_workspace_root(),
            settings,
            Catalog::embedded().unwrap(),
            WebConfig {
                today: NaiveDate::from_ymd_opt(2026, 2, 7),
                ..WebConfig::default()
            },
        )
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn handler_smoke_landing_and_dashboard() {
        let app = app(test_state());
        let (status, text) = get_text(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("proposal service"));
        let (status, text) = get_text(app, "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("진행 중인 공모"));
        assert!(text.contains("AI 어시스턴트와 대화"));
    }

    #[tokio::test]
    async fn projects_first_page_holds_ten_and_second_holds_one() {
        let app = app(test_state());
        let (status, first) = get_text(app.clone(), "/projects").await;
        assert_eq!(status, StatusCode::OK);
        assert!(first.contains("기술창업 기업 투자유치 지원"));
        assert!(!first.contains("청년창업 사관학교 모집"));
        assert!(first.contains("2026년 2월 7일 15시 42분"));

        let (_, second) = get_text(app, "/projects/table?page=2").await;
        assert!(second.contains("청년창업 사관학교 모집"));
        assert!(!second.contains("기술창업 기업 투자유치 지원"));
    }

    #[tokio::test]
    async fn committed_search_filters_and_resets_page() {
        let app = app(test_state());
        let (status, text) = get_text(app, "/projects/table?commit=1&q=AI&page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("AI 기술개발 및 사업화 지원"));
        assert!(text.contains("지역균형 R&amp;D 혁신사업"));
        assert!(!text.contains("딥테크 기술사업화 지원"));
    }

    #[tokio::test]
    async fn search_form_is_rendered_inside_the_swapped_view() {
        let app = app(test_state());
        let (_, page) = get_text(app.clone(), "/projects?tab=closed&sort=deadline").await;
        let view_start = page.find("id=\"projects-view\"").unwrap();
        let hidden_tab = page.find("name=\"tab\" value=\"closed\"").unwrap();
        assert!(hidden_tab > view_start);

        // The fragment a tab click swaps in carries the form with the new tab.
        let (_, fragment) = get_text(app, "/projects/table?tab=closed&sort=deadline").await;
        assert!(fragment.contains("name=\"tab\" value=\"closed\""));
        assert!(fragment.contains("name=\"sort\" value=\"deadline\""));
        assert!(fragment.contains("class=\"filters\""));
    }

    #[tokio::test]
    async fn commit_after_tab_change_keeps_the_new_tab() {
        let app = app(test_state());
        let (status, text) = get_text(
            app,
            "/projects/table?commit=1&tab=closed&sort=deadline&order=asc&q=AI&page=3",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("class=\"tab active\">모집마감</a>"));
        assert!(text.contains("class=\"sort active\">모집 마감일</a>"));
        assert!(text.contains("name=\"tab\" value=\"closed\""));
        assert!(text.contains("value=\"AI\""));
    }

    #[tokio::test]
    async fn pending_refresh_polls_the_fragment_with_current_query() {
        let mut state = test_state();
        state.refresher = CrawlRefresher::new(Duration::from_secs(60));
        let app = app(state);
        let resp = app
            .clone()
            .oneshot(post_form("/projects/refresh?tab=closed", ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/projects?tab=closed");

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/projects/table?tab=closed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()["hx-trigger"], "projectsTableLoaded");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("hx-trigger=\"every 1s\""));
        assert!(text.contains("수집 중..."));
        assert!(text.contains("tab=closed"));
    }

    #[tokio::test]
    async fn source_badges_carry_a_per_source_class() {
        let (_, text) = get_text(app(test_state()), "/projects/table").await;
        assert!(text.contains("badge badge-tips"));
        assert!(text.contains("badge badge-gov-kr"));
        assert!(text.contains("badge badge-k-startup"));
    }

    #[tokio::test]
    async fn closed_tab_is_empty_before_any_deadline() {
        let app = app(test_state());
        let (status, text) = get_text(app, "/projects/table?tab=closed").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("검색 결과가 없습니다"));
    }

    #[tokio::test]
    async fn garbage_params_fall_back_to_defaults() {
        let app = app(test_state());
        let (status, text) =
            get_text(app, "/projects/table?tab=bogus&sort=nope&order=x&page=-4").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("기술창업 기업 투자유치 지원"));
    }

    #[tokio::test]
    async fn open_without_url_returns_to_list_and_unknown_is_404() {
        let app = app(test_state());
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/projects/3/open").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/projects");

        let (status, _) = get_text(app, "/projects/999/open").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn theme_cookie_round_trip() {
        let app = app(test_state());
        let resp = app
            .clone()
            .oneshot(post_form("/theme", "back=%2Fhr"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/hr");
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme=dark"));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, "other=1; theme=dark")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("theme-dark"));
    }

    #[tokio::test]
    async fn chat_message_is_recorded_and_answered() {
        let state = test_state();
        let app = app(state.clone());
        let resp = app
            .clone()
            .oneshot(post_form("/ai-human", "message=%EC%95%88%EB%85%95"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!state.chat.is_thinking());
        let (_, text) = get_text(app, "/ai-human").await;
        assert!(text.contains("안녕"));
        assert!(text.contains(gongmo_assist::CANNED_REPLIES[0]));
    }

    #[tokio::test]
    async fn proposal_export_requires_generation() {
        let state = test_state();
        let app = app(state.clone());
        let (status, _) = get_text(app.clone(), "/proposal/export").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.clone()
            .oneshot(post_form("/proposal", "project_name=Alpha&budget=3"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let resp = app
            .oneshot(Request::builder().uri("/proposal/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/msword");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("<h1>Alpha</h1>"));
    }

    #[tokio::test]
    async fn listings_api_reports_page_metadata() {
        let app = app(test_state());
        let (status, text) =
            get_text(app, "/api/listings?sort=deadline&order=asc&page=9").await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["page"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["total_items"], 11);
        assert_eq!(body["items"][0]["id"], 10);
    }

    #[tokio::test]
    async fn stylesheet_is_served_from_workspace_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state();
        state.workspace_root = dir.path().to_path_buf();
        let (status, _) = get_text(app(state.clone()), "/assets/static/app.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        std::fs::create_dir_all(dir.path().join("assets/static")).unwrap();
        std::fs::write(dir.path().join("assets/static/app.css"), "body{}").unwrap();
        let (status, css) = get_text(app(state), "/assets/static/app.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(css, "body{}");
    }

    #[tokio::test]
    async fn hr_search_filters_table() {
        let app = app(test_state());
        let (status, text) = get_text(app, "/hr?q=%EA%B0%9C%EB%B0%9C").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("김철수"));
        assert!(!text.contains("이영희"));
    }

    #[tokio::test]
    async fn admin_links_to_main_app() {
        let config = WebConfig {
            main_app_url: "http://main.example:3000".into(),
            ..WebConfig::default()
        };
        let (status, text) = get_text(admin_app(config), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("main.example:3000"));
        assert!(text.contains("Proposal 서비스 어드민"));
    }

    #[test]
    fn href_round_trips_through_params() {
        let mut state = QueryState::default();
        state.draft_mut().search_text = "AI ICT".into();
        state.draft_mut().category = CategoryFilter::from_label("AI/ICT");
        state.commit();
        state.set_tab(ListTab::Closed);
        state.set_page(3);
        let href = projects_href(&state);
        assert!(href.contains("q=AI%20ICT"));
        assert!(href.contains("category=AI%2FICT"));
        assert!(href.contains("tab=closed"));
        assert!(href.contains("page=3"));
    }
}
