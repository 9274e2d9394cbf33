//! Agent Loop
//!
//! Drives the plan → action → observe → output protocol for one user query.
//! Each iteration sends the whole conversation, appends the reply, decodes
//! its step and dispatches:
//!
//! - `plan`: notice, continue
//! - `action`: call the named tool, feed its result back as an observe turn, continue
//! - `output`: show the answer and any generated files, stop
//! - anything else: warning, stop

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AgentError, Result};
use crate::event::{AgentEvent, Presenter};
use crate::message::Message;
use crate::preview::GeneratedFiles;
use crate::provider::{GenerationOptions, LlmProvider};
use crate::session::Session;
use crate::step::{Observation, Step, StepError};
use crate::tool::{ToolLookup, ToolRegistry};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Instruction block the session is seeded with
    pub system_prompt: String,

    /// Ceiling on completion requests per query; `None` means unbounded
    pub max_iterations: Option<usize>,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,

    /// Tell the model when it names a tool that does not exist
    pub report_unknown_tools: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            report_unknown_tools: false,
        }
    }
}

const DEFAULT_MAX_ITERATIONS: usize = 25;

impl AgentConfig {
    /// Overlay `BUILDER_MODEL`, `BUILDER_MAX_ITERATIONS` (0 = unbounded) and
    /// `BUILDER_REPORT_UNKNOWN_TOOLS` onto the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same overlay with variables read through `var`
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(model) = var("BUILDER_MODEL") {
            config.generation.model = model;
        }
        if let Some(max) = var("BUILDER_MAX_ITERATIONS") {
            config.max_iterations = parse_max_iterations(&max);
        }
        if let Some(flag) = var("BUILDER_REPORT_UNKNOWN_TOOLS") {
            config.report_unknown_tools = parse_flag(&flag);
        }

        config
    }
}

/// `0` lifts the ceiling; anything unparsable keeps the default.
fn parse_max_iterations(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => None,
        Ok(max) => Some(max),
        Err(_) => Some(DEFAULT_MAX_ITERATIONS),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// How a query ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// The model produced an output step
    Completed,
    /// The model produced a step the loop does not follow
    Unhandled,
}

/// Summary of one query
#[derive(Clone, Debug, Serialize)]
pub struct QueryOutcome {
    pub status: QueryStatus,

    /// Completion requests issued for this query
    pub requests: usize,

    /// Files from the output step, if any
    pub files: Option<GeneratedFiles>,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Build the full system prompt including tool descriptions
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.trim_end().to_string();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Start a session seeded with the instruction block
    pub fn new_session(&self) -> Session {
        Session::new(self.build_system_prompt())
    }

    /// Run the loop for one user query
    pub async fn run(
        &self,
        session: &mut Session,
        query: &str,
        presenter: &mut dyn Presenter,
    ) -> Result<QueryOutcome> {
        session.append(Message::user(query));

        let mut requests = 0;

        loop {
            if let Some(max) = self.config.max_iterations {
                if requests >= max {
                    return Err(AgentError::MaxIterations(max));
                }
            }

            let completion = self
                .provider
                .complete(session.conversation().messages(), &self.config.generation)
                .await?;
            requests += 1;

            session.append(Message::assistant(completion.content.as_str()));

            let step = match Step::decode(&completion.content) {
                Ok(step) => step,
                Err(StepError::NotJson(e)) => {
                    tracing::error!(session = %session.id, "Model reply is not JSON: {}", e);
                    return Err(AgentError::MalformedResponse(e));
                }
                Err(StepError::UnrecognizedStep(step)) => {
                    return Ok(self.unhandled(presenter, step, requests));
                }
            };

            tracing::debug!(
                session = %session.id,
                step = step.name(),
                requests,
                tokens = session.conversation().estimate_tokens(),
                "Model step"
            );

            match step {
                Step::Plan { content } => {
                    emit(presenter, AgentEvent::Plan { content });
                }
                Step::Action { function, input, .. } => {
                    self.act(session, function, input.unwrap_or_default(), presenter)
                        .await;
                }
                Step::Output { content, files } => {
                    emit(presenter, AgentEvent::Output { content });
                    if let Some(files) = &files {
                        render_files(presenter, files);
                    }
                    return Ok(QueryOutcome {
                        status: QueryStatus::Completed,
                        requests,
                        files,
                    });
                }
                Step::Observe { .. } => {
                    return Ok(self.unhandled(presenter, Some("observe".into()), requests));
                }
            }
        }
    }

    /// Execute an action step
    async fn act(
        &self,
        session: &mut Session,
        function: Option<String>,
        input: String,
        presenter: &mut dyn Presenter,
    ) {
        emit(
            presenter,
            AgentEvent::Action {
                function: function.clone(),
                input: input.clone(),
            },
        );

        match self.tools.resolve(function.as_deref()) {
            ToolLookup::Found(tool) => {
                let name = tool.schema().name;
                tracing::info!(tool = %name, input = %input, "Executing tool");

                let output = tool.invoke(&input).await;

                emit(
                    presenter,
                    AgentEvent::ToolOutput {
                        tool: name,
                        output: output.clone(),
                    },
                );
                session.append(Message::user(Observation::new(&output).to_json()));
            }
            ToolLookup::NotFound(function) => {
                tracing::warn!(tool = ?function, "Unknown tool requested");

                if self.config.report_unknown_tools {
                    let note = format!(
                        "Unknown tool requested: {}. Available tools: {}",
                        function.as_deref().unwrap_or("<none>"),
                        self.tools.names().join(", ")
                    );
                    session.append(Message::user(Observation::new(&note).to_json()));
                }
                emit(presenter, AgentEvent::UnknownTool { function });
            }
        }
    }

    fn unhandled(
        &self,
        presenter: &mut dyn Presenter,
        step: Option<String>,
        requests: usize,
    ) -> QueryOutcome {
        tracing::warn!(step = ?step, "Unhandled step or format");
        emit(presenter, AgentEvent::Unhandled { step });
        QueryOutcome {
            status: QueryStatus::Unhandled,
            requests,
            files: None,
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn emit(presenter: &mut dyn Presenter, event: AgentEvent) {
    tracing::debug!("{}", event.summary());
    presenter.present(event);
}

fn render_files(presenter: &mut dyn Presenter, files: &GeneratedFiles) {
    for file in files {
        emit(
            presenter,
            AgentEvent::File {
                name: file.name.clone(),
                language: file.language(),
                content: file.content.clone(),
            },
        );
    }
    emit(presenter, AgentEvent::Preview(files.preview()));
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_iterations(mut self, max: Option<usize>) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn report_unknown_tools(mut self, report: bool) -> Self {
        self.config.report_unknown_tools = report;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::ScriptedProvider;
    use crate::tool::{Tool, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Stands in for the weather lookup and records its inputs.
    #[derive(Clone, Default)]
    struct RecordingWeather {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Tool for RecordingWeather {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_weather".into(),
                description: "returns weather info.".into(),
                argument: "city".into(),
                has_side_effects: false,
            }
        }

        async fn invoke(&self, input: &str) -> String {
            self.calls.lock().unwrap().push(input.to_string());
            format!("The weather in {input} is Sunny +20°C.")
        }
    }

    fn agent_with(
        replies: &[&str],
        config: AgentConfig,
    ) -> (Agent, Arc<ScriptedProvider>, RecordingWeather) {
        let provider = Arc::new(ScriptedProvider::new(replies.iter().copied()));
        let weather = RecordingWeather::default();
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(weather.clone())
            .config(AgentConfig {
                system_prompt: "You build web apps.".into(),
                ..config
            })
            .build()
            .unwrap();
        (agent, provider, weather)
    }

    fn observe_count(session: &Session) -> usize {
        session
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.role == Role::User && m.content.contains(r#""step":"observe""#))
            .count()
    }

    const PLAN: &str = r#"{"step": "plan", "content": "Check the weather, then build the app"}"#;
    const WEATHER: &str = r#"{"step": "action", "content": "", "function": "get_weather", "input": "Paris"}"#;
    const OUTPUT_WITH_FILES: &str = r#"{"step": "output", "content": "Here is your app code.", "files": {"index.html": "<h1>Weather</h1>", "styles.css": "h1 { color: teal; }", "app.js": "document.title = 'Paris';"}}"#;
    const OUTPUT_PLAIN: &str = r#"{"step": "output", "content": "It is sunny in Paris."}"#;

    #[tokio::test]
    async fn test_plan_action_output_script() {
        let (agent, provider, weather) =
            agent_with(&[PLAN, WEATHER, OUTPUT_WITH_FILES], AgentConfig::default());
        let mut session = agent.new_session();
        let mut events = Vec::new();

        let outcome = agent
            .run(&mut session, "Build a weather page for Paris", &mut events)
            .await
            .unwrap();

        assert_eq!(outcome.status, QueryStatus::Completed);
        assert_eq!(outcome.requests, 3);
        assert_eq!(provider.request_count(), 3);
        assert_eq!(*weather.calls.lock().unwrap(), ["Paris"]);
        assert_eq!(observe_count(&session), 1);
        // seed + query + 3 replies + 1 observe
        assert_eq!(session.message_count(), 6);

        let plans = events.iter().filter(|e| matches!(e, AgentEvent::Plan { .. })).count();
        assert_eq!(plans, 1);

        let files: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::File { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(files, ["index.html", "styles.css", "app.js"]);

        let previews: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Preview(doc) => Some(doc),
                _ => None,
            })
            .collect();
        assert_eq!(previews.len(), 1);
        assert!(previews[0].html.contains("<h1>Weather</h1>"));
        assert!(previews[0].html.contains("<style>h1 { color: teal; }</style>"));
        assert!(previews[0].html.contains("<script>document.title = 'Paris';</script>"));
    }

    #[tokio::test]
    async fn test_observation_is_sent_back() {
        let (agent, provider, _) = agent_with(&[WEATHER, OUTPUT_PLAIN], AgentConfig::default());
        let mut session = agent.new_session();

        agent.run(&mut session, "weather?", &mut Vec::new()).await.unwrap();

        let requests = provider.requests();
        let last = requests[1].last().unwrap();
        assert_eq!(last.role, Role::User);
        let value: serde_json::Value = serde_json::from_str(&last.content).unwrap();
        assert_eq!(value["step"], "observe");
        assert_eq!(value["output"], "The weather in Paris is Sunny +20°C.");
    }

    #[tokio::test]
    async fn test_unknown_tool_invokes_nothing() {
        let action = r#"{"step": "action", "function": "launch_rocket", "input": "moon"}"#;
        let (agent, _, weather) = agent_with(&[action, OUTPUT_PLAIN], AgentConfig::default());
        let mut session = agent.new_session();
        let mut events = Vec::new();

        let outcome = agent.run(&mut session, "go", &mut events).await.unwrap();

        assert_eq!(outcome.status, QueryStatus::Completed);
        assert!(weather.calls.lock().unwrap().is_empty());
        assert!(events.contains(&AgentEvent::UnknownTool {
            function: Some("launch_rocket".into())
        }));
        assert_eq!(observe_count(&session), 0);
        assert_eq!(session.message_count(), 4);
    }

    #[tokio::test]
    async fn test_unknown_tool_can_be_reported() {
        let action = r#"{"step": "action", "function": "launch_rocket", "input": "moon"}"#;
        let config = AgentConfig {
            report_unknown_tools: true,
            ..AgentConfig::default()
        };
        let (agent, _, _) = agent_with(&[action, OUTPUT_PLAIN], config);
        let mut session = agent.new_session();

        agent.run(&mut session, "go", &mut Vec::new()).await.unwrap();

        assert_eq!(observe_count(&session), 1);
        let note = &session.conversation().messages()[3].content;
        assert!(note.contains("launch_rocket"));
        assert!(note.contains("get_weather"));
    }

    #[tokio::test]
    async fn test_output_without_files_has_no_preview() {
        let (agent, _, _) = agent_with(&[OUTPUT_PLAIN], AgentConfig::default());
        let mut session = agent.new_session();
        let mut events = Vec::new();

        let outcome = agent.run(&mut session, "weather?", &mut events).await.unwrap();

        assert!(outcome.files.is_none());
        assert_eq!(
            events,
            [AgentEvent::Output {
                content: "It is sunny in Paris.".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_two_plans_then_output() {
        let (agent, provider, _) = agent_with(&[PLAN, PLAN, OUTPUT_PLAIN], AgentConfig::default());
        let mut session = agent.new_session();

        let outcome = agent.run(&mut session, "todo app", &mut Vec::new()).await.unwrap();

        assert_eq!(outcome.requests, 3);
        assert_eq!(provider.request_count(), 3);
        // seed + query + 3 replies
        assert_eq!(session.message_count(), 5);
        // every request carries the whole history so far
        let sizes: Vec<_> = provider.requests().iter().map(Vec::len).collect();
        assert_eq!(sizes, [2, 3, 4]);
    }

    #[tokio::test]
    async fn test_non_json_reply_aborts_query() {
        let (agent, _, _) = agent_with(&["Sure! Here is a todo app."], AgentConfig::default());
        let mut session = agent.new_session();

        let err = agent.run(&mut session, "todo app", &mut Vec::new()).await.unwrap_err();

        assert!(matches!(err, AgentError::MalformedResponse(_)));
        assert_eq!(session.conversation().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_unrecognized_step_warns_and_stops() {
        let (agent, provider, _) =
            agent_with(&[r#"{"step": "dance"}"#, OUTPUT_PLAIN], AgentConfig::default());
        let mut session = agent.new_session();
        let mut events = Vec::new();

        let outcome = agent.run(&mut session, "todo app", &mut events).await.unwrap();

        assert_eq!(outcome.status, QueryStatus::Unhandled);
        assert_eq!(provider.request_count(), 1);
        assert_eq!(events, [AgentEvent::Unhandled { step: Some("dance".into()) }]);
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let config = AgentConfig {
            max_iterations: Some(2),
            ..AgentConfig::default()
        };
        let (agent, provider, _) = agent_with(&[PLAN, PLAN, PLAN], config);
        let mut session = agent.new_session();

        let err = agent.run(&mut session, "loop", &mut Vec::new()).await.unwrap_err();

        assert!(matches!(err, AgentError::MaxIterations(2)));
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unbounded_loop_runs_past_default_ceiling() {
        let config = AgentConfig {
            max_iterations: None,
            ..AgentConfig::default()
        };
        let mut replies = vec![PLAN; 30];
        replies.push(OUTPUT_PLAIN);
        let (agent, provider, _) = agent_with(&replies, config);
        let mut session = agent.new_session();

        let outcome = agent.run(&mut session, "keep planning", &mut Vec::new()).await.unwrap();

        assert_eq!(outcome.status, QueryStatus::Completed);
        assert_eq!(outcome.requests, 31);
        assert_eq!(provider.request_count(), 31);
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_without_vars() {
        let config = AgentConfig::from_lookup(lookup(&[]));
        assert_eq!(config.max_iterations, Some(25));
        assert!(!config.report_unknown_tools);
        assert_eq!(config.generation.model, GenerationOptions::default().model);
    }

    #[test]
    fn test_config_from_vars() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("BUILDER_MODEL", "gpt-4o-mini"),
            ("BUILDER_MAX_ITERATIONS", "0"),
            ("BUILDER_REPORT_UNKNOWN_TOOLS", "yes"),
        ]));
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.max_iterations, None);
        assert!(config.report_unknown_tools);

        let config = AgentConfig::from_lookup(lookup(&[("BUILDER_MAX_ITERATIONS", "7")]));
        assert_eq!(config.max_iterations, Some(7));
    }

    #[test]
    fn test_max_iterations_parsing() {
        assert_eq!(parse_max_iterations("0"), None);
        assert_eq!(parse_max_iterations("12"), Some(12));
        assert_eq!(parse_max_iterations("lots"), Some(25));
        assert_eq!(parse_max_iterations("-3"), Some(25));
    }

    #[test]
    fn test_flag_parsing() {
        for on in ["1", "true", "yes", "TRUE"] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["0", "false", "no", ""] {
            assert!(!parse_flag(off), "{off}");
        }
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let (agent, _, _) = agent_with(&[], AgentConfig::default());
        let prompt = agent.build_system_prompt();
        assert!(prompt.starts_with("You build web apps."));
        assert!(prompt.contains("- get_weather(city): returns weather info."));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
