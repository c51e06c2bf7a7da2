//! MCP server implementation.
//!
//! [`DevRevServer`] implements the rmcp `ServerHandler` trait and exposes
//! DevRev operations as tools, object lookups as resources, and a few
//! support workflows as prompts.
//!
//! Every tool returns pretty-printed JSON on success. Failures are rendered
//! through [`format_error`] and sanitized before they reach the caller.
//! List tools clamp the caller's page size with the configured
//! [`PageLimits`](crate::pagination::PageLimits) and wrap results in a
//! [`PaginatedEnvelope`](crate::pagination::PaginatedEnvelope).

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use rmcp::{
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::{
        AnnotateAble, GetPromptRequestParam, GetPromptResult, Implementation,
        ListPromptsResult, ListResourcesResult, PaginatedRequestParam, PromptMessage,
        PromptMessageRole, RawResource, ReadResourceRequestParam, ReadResourceResult,
        ResourceContents, ServerCapabilities, ServerInfo,
    },
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde_json::{json, Value};

use crate::client::DevRevClient;
use crate::config::ServerConfig;
use crate::error::{format_error, ApiError, DevRevError, ErrorKind};
use crate::middleware::audit;
use crate::models::{
    parse_namespace, Account, Article, Conversation, CreateWorkRequest, DevUser,
    HybridSearchRequest, IssuePriority, ListRequest, OwnedBySet, Part, Resource,
    TicketSeverity, UpdateWorkRequest, Work, WorkType, SEARCH_NAMESPACES,
};
use crate::pagination::build_envelope;
use crate::tools::{
    AccountPromptArgs, CreateWorkInput, DraftResponsePromptArgs, EscalatePromptArgs,
    HybridSearchInput, InvestigatePromptArgs, ListIncidentsInput, ListWorksInput, ObjectIdInput,
    PageInput, TicketPromptArgs, UpdateWorkInput,
};

/// URI of the static server-information resource.
pub const SERVER_INFO_URI: &str = "devrev://server/info";

const URI_SCHEME: &str = "devrev://";

/// The DevRev MCP server.
#[derive(Clone)]
pub struct DevRevServer {
    client: DevRevClient,
    config: Arc<ServerConfig>,
    started: Instant,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

#[tool_router]
impl DevRevServer {
    /// Creates a new server around a configured client.
    pub fn new(client: DevRevClient, config: ServerConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            started: Instant::now(),
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// Reports version, uptime and enabled features.
    #[tool(description = "Get DevRev MCP Server information: version, uptime, enabled features and transport. Use this when asked about the server's version, capabilities or status.")]
    pub async fn devrev_server_info(&self) -> Result<String, String> {
        tracing::debug!("devrev_server_info tool called");
        self.run_tool("devrev_server_info", async { Ok(self.server_info()) })
            .await
    }

    // ========================================================================
    // Works
    // ========================================================================

    /// Lists work items.
    #[tool(description = "List DevRev work items (tickets, issues, tasks, opportunities). Filter by type, part or owner. Returns a page of items and a next_cursor when more exist.")]
    pub async fn devrev_works_list(
        &self,
        Parameters(input): Parameters<ListWorksInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_works_list tool called");
        self.run_tool("devrev_works_list", self.list_works(input))
            .await
    }

    /// Fetches one work item.
    #[tool(description = "Get a DevRev work item (ticket, issue, task) by ID, e.g. don:core:dvrv-us-1:devo/1:ticket/123.")]
    pub async fn devrev_works_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_works_get tool called");
        self.run_tool("devrev_works_get", self.get_object::<Work>(&input.id))
            .await
    }

    /// Creates a work item.
    #[tool(description = "Create a DevRev work item. Requires title, applies_to_part, type (TICKET, ISSUE, TASK, OPPORTUNITY) and owned_by. Optional body, priority (P0-P3) and severity (BLOCKER, HIGH, MEDIUM, LOW).")]
    pub async fn devrev_works_create(
        &self,
        Parameters(input): Parameters<CreateWorkInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(title = %input.title, work_type = %input.work_type, "devrev_works_create tool called");
        self.run_tool("devrev_works_create", self.create_work(input))
            .await
    }

    /// Updates a work item.
    #[tool(description = "Update an existing DevRev work item. Only provided fields (title, body, owned_by, priority, severity) are changed.")]
    pub async fn devrev_works_update(
        &self,
        Parameters(input): Parameters<UpdateWorkInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_works_update tool called");
        self.run_tool("devrev_works_update", self.update_work(input))
            .await
    }

    // ========================================================================
    // Accounts, articles, parts, users, conversations
    // ========================================================================

    /// Lists accounts.
    #[tool(description = "List DevRev customer accounts. Returns a page of accounts and a next_cursor when more exist.")]
    pub async fn devrev_accounts_list(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_accounts_list tool called");
        self.run_tool("devrev_accounts_list", self.list_simple::<Account>(input))
            .await
    }

    /// Fetches one account.
    #[tool(description = "Get a DevRev customer account by ID.")]
    pub async fn devrev_accounts_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_accounts_get tool called");
        self.run_tool("devrev_accounts_get", self.get_object::<Account>(&input.id))
            .await
    }

    /// Lists articles.
    #[tool(description = "List DevRev knowledge-base articles. Returns a page of articles and a next_cursor when more exist.")]
    pub async fn devrev_articles_list(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_articles_list tool called");
        self.run_tool("devrev_articles_list", self.list_simple::<Article>(input))
            .await
    }

    /// Fetches one article.
    #[tool(description = "Get a DevRev knowledge-base article by ID.")]
    pub async fn devrev_articles_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_articles_get tool called");
        self.run_tool("devrev_articles_get", self.get_object::<Article>(&input.id))
            .await
    }

    /// Lists parts.
    #[tool(description = "List DevRev product parts (products, capabilities, features). Returns a page of parts and a next_cursor when more exist.")]
    pub async fn devrev_parts_list(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_parts_list tool called");
        self.run_tool("devrev_parts_list", self.list_simple::<Part>(input))
            .await
    }

    /// Fetches one part.
    #[tool(description = "Get a DevRev product part by ID.")]
    pub async fn devrev_parts_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_parts_get tool called");
        self.run_tool("devrev_parts_get", self.get_object::<Part>(&input.id))
            .await
    }

    /// Lists dev users.
    #[tool(description = "List DevRev users (internal team members). Returns a page of users and a next_cursor when more exist.")]
    pub async fn devrev_users_list(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_users_list tool called");
        self.run_tool("devrev_users_list", self.list_simple::<DevUser>(input))
            .await
    }

    /// Fetches one dev user, or the token owner for `self`.
    #[tool(description = "Get a DevRev user by ID. Pass 'self' to get the user that owns the API token.")]
    pub async fn devrev_users_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_users_get tool called");
        self.run_tool("devrev_users_get", self.get_user(&input.id))
            .await
    }

    /// Lists conversations.
    #[tool(description = "List DevRev customer conversations. Returns a page of conversations and a next_cursor when more exist.")]
    pub async fn devrev_conversations_list(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_conversations_list tool called");
        self.run_tool(
            "devrev_conversations_list",
            self.list_simple::<Conversation>(input),
        )
        .await
    }

    /// Fetches one conversation.
    #[tool(description = "Get a DevRev customer conversation by ID.")]
    pub async fn devrev_conversations_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_conversations_get tool called");
        self.run_tool(
            "devrev_conversations_get",
            self.get_object::<Conversation>(&input.id),
        )
        .await
    }

    // ========================================================================
    // Beta tools
    // ========================================================================

    /// Lists incidents (beta).
    #[tool(description = "List DevRev incidents (beta API). Filter by stage or severity. Returns a page of incidents and a next_cursor when more exist.")]
    pub async fn devrev_incidents_list(
        &self,
        Parameters(input): Parameters<ListIncidentsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "devrev_incidents_list tool called");
        self.run_tool("devrev_incidents_list", self.list_incidents(input))
            .await
    }

    /// Fetches one incident (beta).
    #[tool(description = "Get a DevRev incident by ID (beta API).")]
    pub async fn devrev_incidents_get(
        &self,
        Parameters(input): Parameters<ObjectIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(id = %input.id, "devrev_incidents_get tool called");
        self.run_tool("devrev_incidents_get", self.get_incident(&input.id))
            .await
    }

    /// Hybrid keyword + semantic search (beta).
    #[tool(description = "Search DevRev with hybrid keyword and semantic matching (beta API). Optionally restrict namespaces (ACCOUNT, ARTICLE, CONVERSATION, WORK, USER, TAG, PART, REV_USER, DEV_USER) and tune semantic_weight (0.0-1.0).")]
    pub async fn devrev_search_hybrid(
        &self,
        Parameters(input): Parameters<HybridSearchInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(query = %input.query, "devrev_search_hybrid tool called");
        self.run_tool("devrev_search_hybrid", self.search_hybrid(input))
            .await
    }
}

// ============================================================================
// Prompts
// ============================================================================

#[prompt_router]
impl DevRevServer {
    /// Triage a support ticket.
    #[prompt(
        name = "triage_ticket",
        description = "Triage a support ticket: recommend priority, severity, component, assignee and next steps."
    )]
    async fn triage_ticket(
        &self,
        Parameters(args): Parameters<TicketPromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        Ok(user_prompt(triage_text(args.ticket_id.trim())))
    }

    /// Investigate a technical issue.
    #[prompt(
        name = "investigate_issue",
        description = "Investigate the technical issue behind a ticket at shallow, standard or deep depth."
    )]
    async fn investigate_issue(
        &self,
        Parameters(args): Parameters<InvestigatePromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let depth = args.depth.as_deref().map(str::trim).unwrap_or("standard");
        Ok(user_prompt(investigate_text(args.ticket_id.trim(), depth)))
    }

    /// Draft a customer reply.
    #[prompt(
        name = "draft_response",
        description = "Draft a customer-facing response for a ticket in a chosen tone."
    )]
    async fn draft_response(
        &self,
        Parameters(args): Parameters<DraftResponsePromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let tone = args.tone.as_deref().map(str::trim).unwrap_or("professional");
        Ok(user_prompt(draft_response_text(
            args.ticket_id.trim(),
            tone,
            args.include_kb.unwrap_or(true),
        )))
    }

    /// Summarize account health.
    #[prompt(
        name = "summarize_account",
        description = "Produce an account health summary from the account record and its recent tickets."
    )]
    async fn summarize_account(
        &self,
        Parameters(args): Parameters<AccountPromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        Ok(user_prompt(summarize_account_text(args.account_id.trim())))
    }

    /// Prepare an escalation brief.
    #[prompt(
        name = "escalate_ticket",
        description = "Prepare an escalation brief for a ticket, given the reason for escalating."
    )]
    async fn escalate_ticket(
        &self,
        Parameters(args): Parameters<EscalatePromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        Ok(user_prompt(escalate_text(
            args.ticket_id.trim(),
            args.reason.trim(),
        )))
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl DevRevServer {
    /// Awaits a tool body, emitting an audit event and rendering the outcome.
    async fn run_tool<Fut>(&self, tool: &'static str, body: Fut) -> Result<String, String>
    where
        Fut: Future<Output = Result<Value, DevRevError>>,
    {
        let started = Instant::now();
        let result = body.await;
        audit::tool_invocation(
            tool,
            result.as_ref().err().map(|e| e.kind().name()),
            started.elapsed(),
        );

        match result {
            Ok(value) => serde_json::to_string_pretty(&value).map_err(|e| {
                tracing::error!(tool, error = %e, "Failed to serialize tool result");
                format!("Failed to serialize result: {}", e)
            }),
            Err(e) => {
                let message = self.client.sanitize(&format_error(&e));
                tracing::error!(tool, kind = e.kind().name(), error = %message, "Tool failed");
                Err(message)
            }
        }
    }

    async fn list_page<T: Resource>(&self, request: ListRequest) -> Result<Value, DevRevError> {
        let page = self.client.list::<T>(&request).await?;
        let items = to_values(&page.items)?;
        Ok(build_envelope(items, page.next_cursor, T::PLURAL).to_value())
    }

    async fn list_simple<T: Resource>(&self, input: PageInput) -> Result<Value, DevRevError> {
        let page = self.config.page_limits.page(input.cursor, input.limit);
        self.list_page::<T>(ListRequest::from(page)).await
    }

    async fn get_object<T: Resource>(&self, id: &str) -> Result<Value, DevRevError> {
        let object = self.client.get::<T>(id).await?;
        Ok(serde_json::to_value(object)?)
    }

    async fn list_works(&self, input: ListWorksInput) -> Result<Value, DevRevError> {
        let types = input
            .work_type
            .as_deref()
            .map(|names| names.iter().map(|n| parse_work_type(n)).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        let page = self.config.page_limits.page(input.cursor, input.limit);
        let request = ListRequest::from(page)
            .with_filter("type", types)?
            .with_filter("applies_to_part", input.applies_to_part)?
            .with_filter("owned_by", input.owned_by)?;
        self.list_page::<Work>(request).await
    }

    async fn create_work(&self, input: CreateWorkInput) -> Result<Value, DevRevError> {
        self.require_destructive()?;
        if input.title.is_empty() {
            return Err(invalid_input("title must not be empty"));
        }
        if input.applies_to_part.is_empty() {
            return Err(invalid_input("applies_to_part must not be empty"));
        }
        let request = CreateWorkRequest {
            work_type: parse_work_type(&input.work_type)?,
            priority: input.priority.as_deref().map(parse_priority).transpose()?,
            severity: input.severity.as_deref().map(parse_severity).transpose()?,
            title: input.title,
            applies_to_part: input.applies_to_part,
            owned_by: input.owned_by,
            body: input.body,
        };
        let work = self.client.create_work(&request).await?;
        tracing::info!(id = %work.id, "Created work item");
        Ok(serde_json::to_value(work)?)
    }

    async fn update_work(&self, input: UpdateWorkInput) -> Result<Value, DevRevError> {
        self.require_destructive()?;
        let request = UpdateWorkRequest {
            priority: input.priority.as_deref().map(parse_priority).transpose()?,
            severity: input.severity.as_deref().map(parse_severity).transpose()?,
            id: input.id,
            title: input.title,
            body: input.body,
            owned_by: input.owned_by.map(|set| OwnedBySet { set }),
        };
        if request.is_empty() {
            return Err(invalid_input("at least one field to update must be provided"));
        }
        let work = self.client.update_work(&request).await?;
        tracing::info!(id = %work.id, "Updated work item");
        Ok(serde_json::to_value(work)?)
    }

    async fn get_user(&self, id: &str) -> Result<Value, DevRevError> {
        if id.eq_ignore_ascii_case("self") {
            let user = self.client.dev_users_self().await?;
            return Ok(serde_json::to_value(user)?);
        }
        self.get_object::<DevUser>(id).await
    }

    async fn list_incidents(&self, input: ListIncidentsInput) -> Result<Value, DevRevError> {
        self.require_beta_tools("incidents")?;
        let page = self.config.page_limits.page(input.cursor, input.limit);
        let request = ListRequest::from(page)
            .with_filter("stage", input.stage)?
            .with_filter("severity", input.severity)?;
        let page = self.client.list_incidents(&request).await?;
        let items = to_values(&page.items)?;
        Ok(build_envelope(items, page.next_cursor, "incidents").to_value())
    }

    async fn get_incident(&self, id: &str) -> Result<Value, DevRevError> {
        self.require_beta_tools("incidents")?;
        let incident = self.client.get_incident(id).await?;
        Ok(serde_json::to_value(incident)?)
    }

    async fn search_hybrid(&self, input: HybridSearchInput) -> Result<Value, DevRevError> {
        self.require_beta_tools("search")?;
        if input.query.is_empty() {
            return Err(invalid_input("query must not be empty"));
        }
        if let Some(weight) = input.semantic_weight {
            if !(0.0..=1.0).contains(&weight) {
                return Err(invalid_input("semantic_weight must be between 0.0 and 1.0"));
            }
        }
        let namespaces = input
            .namespaces
            .as_deref()
            .map(|names| names.iter().map(|n| parse_search_namespace(n)).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        let page = self.config.page_limits.page(input.cursor, input.limit);
        let request = HybridSearchRequest {
            query: input.query,
            namespaces,
            semantic_weight: input.semantic_weight,
            limit: Some(page.limit),
            cursor: page.cursor,
        };

        let response = self.client.search_hybrid(&request).await?;
        let items = to_values(&response.results)?;
        let mut envelope = build_envelope(items, response.next_cursor, "results").to_value();
        if let (Some(total), Some(map)) = (response.total_count, envelope.as_object_mut()) {
            map.insert("total_count".to_string(), Value::from(total));
        }
        Ok(envelope)
    }

    fn require_destructive(&self) -> Result<(), DevRevError> {
        if self.config.enable_destructive_tools {
            return Ok(());
        }
        Err(ApiError::new(
            ErrorKind::Forbidden,
            "Destructive tools are disabled. Set MCP_ENABLE_DESTRUCTIVE_TOOLS=true to enable them",
        )
        .into())
    }

    fn require_beta_tools(&self, feature: &str) -> Result<(), DevRevError> {
        if self.config.enable_beta_tools {
            return Ok(());
        }
        Err(ApiError::beta_required(feature).into())
    }

    fn server_info(&self) -> Value {
        json!({
            "server": {
                "name": self.config.server_name,
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_seconds": self.started.elapsed().as_secs(),
                "platform": std::env::consts::OS,
            },
            "capabilities": {
                "api_version": self.client.api_version().as_str(),
                "beta_tools_enabled": self.config.enable_beta_tools,
                "destructive_tools_enabled": self.config.enable_destructive_tools,
                "transport": self.config.transport.as_str(),
                "auth_mode": if self.config.auth_token.is_some() { "bearer" } else { "none" },
                "audit_logging": self.config.audit_log_enabled,
                "rate_limit_rpm": self.config.rate_limit_rpm,
                "default_page_size": self.config.page_limits.default_page_size,
                "max_page_size": self.config.page_limits.max_page_size,
            },
        })
    }

    fn static_server_info(&self) -> Value {
        json!({
            "uri": SERVER_INFO_URI,
            "type": "server_info",
            "name": self.config.server_name,
            "version": env!("CARGO_PKG_VERSION"),
            "platform": std::env::consts::OS,
            "note": "Use the devrev_server_info tool for uptime and enabled features.",
        })
    }

    async fn read_object(&self, kind: ResourceKind, id: &str) -> Result<Value, DevRevError> {
        match kind {
            ResourceKind::Ticket => self.get_object::<Work>(id).await,
            ResourceKind::Account => self.get_object::<Account>(id).await,
            ResourceKind::Article => self.get_object::<Article>(id).await,
            ResourceKind::Part => self.get_object::<Part>(id).await,
            ResourceKind::User => self.get_object::<DevUser>(id).await,
            ResourceKind::Conversation => self.get_object::<Conversation>(id).await,
        }
    }
}

impl DevRevServer {
    /// Resolves a `devrev://` resource URI to its JSON body.
    ///
    /// Unknown URIs and objects DevRev reports as missing map to
    /// `resource_not_found`. Other failures are internal errors.
    pub async fn read_resource_value(&self, uri: &str) -> Result<Value, McpError> {
        if uri == SERVER_INFO_URI {
            return Ok(self.static_server_info());
        }
        let Some((kind, id)) = parse_resource_uri(uri) else {
            return Err(McpError::resource_not_found(
                "resource_not_found",
                Some(json!({"uri": uri})),
            ));
        };
        self.read_object(kind, id).await.map_err(|e| {
            let message = self.client.sanitize(&format_error(&e));
            tracing::error!(uri = %uri, error = %message, "Failed to read resource");
            match e.kind() {
                ErrorKind::NotFound => {
                    McpError::resource_not_found(message, Some(json!({"uri": uri})))
                }
                _ => McpError::internal_error(message, None),
            }
        })
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for DevRevServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Access DevRev work items, accounts, articles, parts, users and conversations. \
                 List tools return {count, <items>, next_cursor}; pass next_cursor back to get \
                 the next page. Objects are also readable as resources at \
                 devrev://<ticket|account|article|part|user|conversation>/<id>. \
                 Incidents and hybrid search need the beta API. \
                 Start with devrev_server_info to see what is enabled."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![RawResource::new(
            SERVER_INFO_URI,
            "server-info".to_string(),
        )
        .no_annotation()]))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        tracing::debug!(uri = %uri, "read_resource called");

        let value = self.read_resource_value(&uri).await?;
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}

/// Object kinds addressable as `devrev://<kind>/<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Work item (ticket, issue, task).
    Ticket,
    /// Customer account.
    Account,
    /// Knowledge-base article.
    Article,
    /// Product part.
    Part,
    /// Dev user. `devrev://user/dev/<id>` is accepted as well.
    User,
    /// Conversation.
    Conversation,
}

/// Splits a `devrev://<kind>/<id>` URI.
///
/// IDs are DONs and may themselves contain `/` and `:`, so everything after
/// the kind segment is the ID.
pub fn parse_resource_uri(uri: &str) -> Option<(ResourceKind, &str)> {
    let rest = uri.strip_prefix(URI_SCHEME)?;
    let (kind, id) = rest.split_once('/')?;
    let kind = match kind {
        "ticket" => ResourceKind::Ticket,
        "account" => ResourceKind::Account,
        "article" => ResourceKind::Article,
        "part" => ResourceKind::Part,
        "user" => ResourceKind::User,
        "conversation" => ResourceKind::Conversation,
        _ => return None,
    };
    let id = match kind {
        ResourceKind::User => id.strip_prefix("dev/").unwrap_or(id),
        _ => id,
    };
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some((kind, id))
}

fn to_values<T: serde::Serialize>(items: &[T]) -> Result<Vec<Value>, DevRevError> {
    Ok(items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?)
}

fn invalid_input(message: impl Into<String>) -> DevRevError {
    ApiError::new(
        ErrorKind::Validation {
            field_errors: BTreeMap::new(),
        },
        message,
    )
    .into()
}

fn parse_work_type(value: &str) -> Result<WorkType, DevRevError> {
    WorkType::parse(value).ok_or_else(|| {
        let valid: Vec<&str> = WorkType::ALL.iter().map(WorkType::name).collect();
        invalid_input(format!(
            "Invalid work type: {} (valid: {})",
            value,
            valid.join(", ")
        ))
    })
}

fn parse_priority(value: &str) -> Result<IssuePriority, DevRevError> {
    IssuePriority::parse(value).ok_or_else(|| {
        let valid: Vec<&str> = IssuePriority::ALL.iter().map(IssuePriority::name).collect();
        invalid_input(format!(
            "Invalid priority: {} (valid: {})",
            value,
            valid.join(", ")
        ))
    })
}

fn parse_severity(value: &str) -> Result<TicketSeverity, DevRevError> {
    TicketSeverity::parse(value).ok_or_else(|| {
        let valid: Vec<&str> = TicketSeverity::ALL.iter().map(TicketSeverity::name).collect();
        invalid_input(format!(
            "Invalid severity: {} (valid: {})",
            value,
            valid.join(", ")
        ))
    })
}

fn parse_search_namespace(value: &str) -> Result<String, DevRevError> {
    parse_namespace(value).map(str::to_string).ok_or_else(|| {
        invalid_input(format!(
            "Invalid search namespace: {} (valid: {})",
            value,
            SEARCH_NAMESPACES.join(", ").to_ascii_uppercase()
        ))
    })
}

// ============================================================================
// Prompt text
// ============================================================================

fn user_prompt(text: String) -> Vec<PromptMessage> {
    vec![PromptMessage::new_text(PromptMessageRole::User, text)]
}

fn triage_text(ticket_id: &str) -> String {
    format!(
        "You are a senior support triage analyst. Analyze ticket {id} and provide:\n\n\
         1. Priority recommendation: p0 (critical), p1 (high), p2 (medium) or p3 (low)\n\
         2. Severity assessment: blocker, high, medium or low\n\
         3. The affected product part\n\
         4. A suggested assignee\n\
         5. Next action steps\n\n\
         Start with `devrev_works_get` to fetch ticket {id}, then use \
         `devrev_search_hybrid` to find similar past tickets before giving your assessment.",
        id = ticket_id
    )
}

fn investigate_text(ticket_id: &str, depth: &str) -> String {
    let (depth, steps) = match depth.to_ascii_lowercase().as_str() {
        "shallow" => (
            "shallow",
            "- Review the ticket and its immediate context\n\
             - Look at 2-3 similar tickets\n\
             - Give an initial assessment",
        ),
        "deep" => (
            "deep",
            "- Review all ticket data, comments and related objects\n\
             - Search broadly for similar tickets (10 or more)\n\
             - Check the account's history for related problems\n\
             - Form a root-cause hypothesis and preventive measures",
        ),
        _ => (
            "standard",
            "- Review the ticket, its comments and timeline\n\
             - Find 5-7 similar tickets and how they were resolved\n\
             - Offer several solution options",
        ),
    };
    format!(
        "You are a senior technical support engineer investigating ticket {id}.\n\n\
         Investigation depth: {depth}\n\n\
         1. Use `devrev_works_get` to fetch ticket {id}.\n\
         2. Investigate:\n{steps}\n\n\
         Report the symptoms, similar cases, likely root cause, ranked solution \
         options, how to verify a fix, and your confidence level.",
        id = ticket_id,
        depth = depth,
        steps = steps
    )
}

fn draft_response_text(ticket_id: &str, tone: &str, include_kb: bool) -> String {
    let guidance = match tone.to_ascii_lowercase().as_str() {
        "formal" => "Use formal, business-appropriate language.",
        "friendly" => "Be warm and approachable while staying professional.",
        "technical" => "Use precise technical terminology and focus on accuracy.",
        _ => "Use clear, professional language.",
    };
    let kb_step = if include_kb {
        "3. Use `devrev_search_hybrid` with the ARTICLE namespace to find knowledge-base \
         articles that answer the question.\n"
    } else {
        ""
    };
    format!(
        "You are a customer support specialist drafting a reply for ticket {id}.\n\n\
         Tone: {tone}. {guidance}\n\n\
         1. Use `devrev_works_get` to fetch ticket {id}.\n\
         2. Read the description and discussion to understand the customer's problem.\n\
         {kb_step}\
         Then draft a reply that acknowledges the issue, gives a solution or next steps, \
         links relevant articles, sets expectations on timing, and offers further help.",
        id = ticket_id,
        tone = tone,
        guidance = guidance,
        kb_step = kb_step
    )
}

fn summarize_account_text(account_id: &str) -> String {
    format!(
        "You are a customer success manager preparing a health summary for account {id}.\n\n\
         1. Use `devrev_accounts_get` to fetch account {id}.\n\
         2. Use `devrev_search_hybrid` to find the account's recent tickets.\n\
         3. Look at ticket volume, resolution times and escalations.\n\n\
         Summarize the account overview, support activity, health trend, risks and \
         recommended next actions for an account review.",
        id = account_id
    )
}

fn escalate_text(ticket_id: &str, reason: &str) -> String {
    format!(
        "You are a support team lead preparing an escalation for ticket {id}.\n\n\
         Escalation reason: {reason}\n\n\
         1. Use `devrev_works_get` to fetch ticket {id}.\n\
         2. Review its history and discussion.\n\
         3. Use `devrev_search_hybrid` to find similar escalations and their outcomes.\n\
         4. Assess customer impact, including tier, affected users and SLA status.\n\n\
         Write an escalation brief with: issue summary, customer impact, timeline, \
         troubleshooting done so far, why it is being escalated, recommended action \
         and urgency.",
        id = ticket_id,
        reason = reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::ApiVersion;
    use std::time::Duration;

    fn test_server(config: ServerConfig) -> DevRevServer {
        let client = DevRevClient::new(&Config {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: "test-token".to_string(),
            api_version: ApiVersion::Public,
            timeout: Duration::from_secs(1),
            max_retries: 1,
        })
        .unwrap();
        DevRevServer::new(client, config)
    }

    #[test]
    fn test_parse_resource_uri() {
        assert_eq!(
            parse_resource_uri("devrev://ticket/don:core:dvrv-us-1:devo/1:ticket/123"),
            Some((ResourceKind::Ticket, "don:core:dvrv-us-1:devo/1:ticket/123"))
        );
        assert_eq!(
            parse_resource_uri("devrev://user/dev/don:identity:devu/7"),
            Some((ResourceKind::User, "don:identity:devu/7"))
        );
        assert_eq!(
            parse_resource_uri("devrev://account/acc-1"),
            Some((ResourceKind::Account, "acc-1"))
        );
        assert_eq!(parse_resource_uri("devrev://ticket/"), None);
        assert_eq!(parse_resource_uri("devrev://widget/1"), None);
        assert_eq!(parse_resource_uri("https://ticket/1"), None);
    }

    #[test]
    fn test_parse_work_type_error_lists_valid_values() {
        let err = parse_work_type("bug").unwrap_err();
        let message = format_error(&err);
        assert!(message.starts_with("Validation error: Invalid work type: bug"));
        assert!(message.contains("TICKET, ISSUE, TASK, OPPORTUNITY"));
    }

    #[test]
    fn test_prompt_texts_reference_tools() {
        assert!(triage_text("T-1").contains("`devrev_works_get` to fetch ticket T-1"));
        assert!(investigate_text("T-1", "DEEP").contains("Investigation depth: deep"));
        assert!(investigate_text("T-1", "bogus").contains("Investigation depth: standard"));
        assert!(draft_response_text("T-1", "friendly", true).contains("ARTICLE namespace"));
        assert!(!draft_response_text("T-1", "friendly", false).contains("ARTICLE namespace"));
        assert!(summarize_account_text("A-1").contains("`devrev_accounts_get` to fetch account A-1"));
        assert!(escalate_text("T-1", "SLA breach").contains("Escalation reason: SLA breach"));
    }

    #[tokio::test]
    async fn test_destructive_tools_disabled() {
        let server = test_server(ServerConfig {
            enable_destructive_tools: false,
            ..Default::default()
        });
        let err = server
            .devrev_works_update(Parameters(UpdateWorkInput {
                id: "w1".to_string(),
                title: Some("x".to_string()),
                body: None,
                owned_by: None,
                priority: None,
                severity: None,
            }))
            .await
            .unwrap_err();
        assert!(err.starts_with("Permission denied: Destructive tools are disabled"));
    }

    #[tokio::test]
    async fn test_beta_tools_disabled() {
        let server = test_server(ServerConfig {
            enable_beta_tools: false,
            ..Default::default()
        });
        let err = server
            .devrev_incidents_list(Parameters(ListIncidentsInput::default()))
            .await
            .unwrap_err();
        assert!(err.starts_with("Beta API required: The incidents service requires the beta API."));
        assert!(err.contains("DEVREV_API_VERSION=beta"));
    }

    #[tokio::test]
    async fn test_beta_tools_need_beta_client() {
        let server = test_server(ServerConfig::default());
        let err = server
            .devrev_search_hybrid(Parameters(HybridSearchInput {
                query: "login".to_string(),
                namespaces: None,
                semantic_weight: None,
                cursor: None,
                limit: None,
            }))
            .await
            .unwrap_err();
        assert!(err.starts_with("Beta API required"));
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let server = test_server(ServerConfig::default());
        let err = server
            .devrev_works_update(Parameters(UpdateWorkInput {
                id: "w1".to_string(),
                title: Some("  ".to_string()),
                body: None,
                owned_by: None,
                priority: None,
                severity: None,
            }))
            .await
            .unwrap_err();
        assert!(err.contains("at least one field"));
    }

    #[tokio::test]
    async fn test_server_info_tool() {
        let server = test_server(ServerConfig::default());
        let text = server.devrev_server_info().await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["server"]["name"], "DevRev MCP Server");
        assert_eq!(value["server"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["capabilities"]["api_version"], "public");
        assert_eq!(value["capabilities"]["auth_mode"], "none");
    }

    #[test]
    fn test_get_info_enables_all_capabilities() {
        let info = test_server(ServerConfig::default()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_some());
        assert_eq!(info.server_info.name, "DevRev MCP Server");
    }

    #[test]
    fn test_prompt_router_registers_workflows() {
        let server = test_server(ServerConfig::default());
        let mut names: Vec<String> = server
            .prompt_router
            .list_all()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "draft_response",
                "escalate_ticket",
                "investigate_issue",
                "summarize_account",
                "triage_ticket",
            ]
        );
    }
}
