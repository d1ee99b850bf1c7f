use crate::cli::dispatcher::GlobalOptions;
use crate::cli::main_types::{
    ConfigCommands, DomainMappingCommands, ExecutionCommands, JobCommands, ProjectCommands,
    RegionCommands, RevisionCommands, ServiceCommands, WorkerPoolCommands,
};
use crate::cli::output::Output;
use run_core::api::fanout::RegionSelector;
use run_core::api::region;
use run_core::api::resource::{ResourceKind, ResourceRef};
use run_core::core::console::console_url;
use run_core::core::models::{Execution, Service, WorkerPool};
use run_core::core::services::config_service::ConfigService;
use run_core::core::services::resource_service::{JobRun, ResourceService};
use run_core::core::services::settings::{Settings, SettingSource};
use run_core::display::{OutputFormat, TableRow, format_time};
use run_core::error::{AppError, CliError};
use run_core::storage::config::Config;
use run_core::storage::credentials::has_env_token;
use run_core::storage::gcloud::GcloudInfo;
use run_core::utils::validation::{parse_instance_count, scale_request};
use serde::Serialize;
use std::path::PathBuf;

/// Resolved settings plus the service used by resource commands.
pub struct CommandContext {
    settings: Settings,
    resources: ResourceService,
    output: Output,
}

impl CommandContext {
    pub fn new(settings: Settings, resources: ResourceService, output: Output) -> Self {
        Self {
            settings,
            resources,
            output,
        }
    }

    fn project(&self) -> Result<&str, AppError> {
        self.settings.require_project()
    }

    fn regions(&self) -> &RegionSelector {
        &self.settings.region.value
    }

    /// Full resource paths carry their own project and region.
    fn reference(&self, name: &str, kind: ResourceKind) -> Result<ResourceRef, AppError> {
        if name.starts_with("projects/") {
            return Ok(ResourceRef::resolve(name, "", "", kind)?);
        }
        let project = self.project()?;
        let region = self.settings.require_region()?;
        Ok(ResourceRef::resolve(name, project, region, kind)?)
    }
}

fn open_in_browser(output: &Output, url: &str) {
    output.message(url);
    if let Err(e) = open::that(url) {
        log::warn!("Could not open a browser: {}", e);
    }
}

#[derive(Default)]
pub struct ServiceHandler;

impl ServiceHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: ServiceCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            ServiceCommands::List => {
                let project = ctx.project()?;
                let services = {
                    let _spinner = ctx.output.spinner(&format!("Listing services in {}", ctx.regions()));
                    ctx.resources.list_services(project, ctx.regions()).await?
                };
                ctx.output.list(&services, "No services found.")
            }
            ServiceCommands::Describe { name } => {
                let reference = ctx.reference(&name, ResourceKind::Service)?;
                let service = ctx.resources.describe_service(&reference).await?;
                ctx.output.details(&service, &service_details(&service))
            }
            ServiceCommands::Scale {
                name,
                manual,
                min,
                max,
            } => {
                let request = scale_request(manual.as_deref(), min.as_deref(), max.as_deref())?;
                let reference = ctx.reference(&name, ResourceKind::Service)?;
                log::debug!("Scaling {} with {:?}", reference, request);

                let service = {
                    let _spinner = ctx.output.spinner(&format!("Updating {}", reference.describe()));
                    ctx.resources.scale_service(&reference, request).await?
                };
                ctx.output.message(&format!(
                    "Scaled {} to {}",
                    reference.describe(),
                    service.scaling.summary()
                ));
                ctx.output.details(&service, &service_details(&service))
            }
            ServiceCommands::Open { name } => {
                let reference = ctx.reference(&name, ResourceKind::Service)?;
                open_in_browser(&ctx.output, &console_url(&reference)?);
                Ok(())
            }
        }
    }
}

fn service_details(service: &Service) -> Vec<(&'static str, String)> {
    let traffic = service
        .traffic
        .iter()
        .map(|t| {
            let target = t.revision.as_deref().unwrap_or("LATEST");
            format!("{}% {}", t.percent, target)
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ("Name", service.short_name.clone()),
        ("Region", service.region.clone()),
        ("Status", service.status().to_string()),
        ("URL", or_dash(service.uri.as_deref())),
        ("Image", or_dash(service.image())),
        ("Scaling", service.scaling.summary()),
        ("Latest Ready", or_dash(service.latest_ready_revision.as_deref())),
        ("Traffic", if traffic.is_empty() { "-".to_string() } else { traffic }),
        ("Service Account", or_dash(service.service_account.as_deref())),
        ("Ingress", or_dash(service.ingress.as_deref())),
        ("Last Modifier", or_dash(service.last_modifier.as_deref())),
        ("Updated", format_time(service.update_time)),
    ]
}

#[derive(Default)]
pub struct RevisionHandler;

impl RevisionHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: RevisionCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            RevisionCommands::List { service } => {
                let project = ctx.project()?;
                let revisions = {
                    let _spinner = ctx.output.spinner(&format!("Listing revisions of {}", service));
                    ctx.resources
                        .list_revisions(project, ctx.regions(), &service)
                        .await?
                };
                ctx.output.list(&revisions, "No revisions found.")
            }
        }
    }
}

#[derive(Default)]
pub struct JobHandler;

impl JobHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: JobCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            JobCommands::List => {
                let project = ctx.project()?;
                let jobs = {
                    let _spinner = ctx.output.spinner(&format!("Listing jobs in {}", ctx.regions()));
                    ctx.resources.list_jobs(project, ctx.regions()).await?
                };
                ctx.output.list(&jobs, "No jobs found.")
            }
            JobCommands::Run { name, wait } => {
                let reference = ctx.reference(&name, ResourceKind::Job)?;
                let message = if wait {
                    format!("Running {}", reference.describe())
                } else {
                    format!("Starting {}", reference.describe())
                };
                let run = {
                    let _spinner = ctx.output.spinner(&message);
                    ctx.resources.run_job(&reference, wait).await?
                };

                match run {
                    JobRun::Started { operation } if ctx.output.format().is_structured() => {
                        ctx.output.details(&StartedRun { operation }, &[])
                    }
                    JobRun::Started { operation } => {
                        println!("Started {} (operation {})", reference.describe(), operation);
                        println!("Follow it with: run-cli execution list --job {}", reference.short_name());
                        Ok(())
                    }
                    JobRun::Finished(execution) => {
                        ctx.output.details(&execution, &execution_details(&execution))
                    }
                }
            }
            JobCommands::Open { name } => {
                let reference = ctx.reference(&name, ResourceKind::Job)?;
                open_in_browser(&ctx.output, &console_url(&reference)?);
                Ok(())
            }
        }
    }
}

#[derive(Serialize)]
struct StartedRun {
    operation: String,
}

fn execution_details(execution: &Execution) -> Vec<(&'static str, String)> {
    let duration = execution
        .duration()
        .map(|d| format!("{}s", d.num_seconds()))
        .unwrap_or_else(|| "-".to_string());

    vec![
        ("Execution", execution.short_name.clone()),
        ("Job", execution.job.clone()),
        ("Region", execution.region.clone()),
        ("Status", execution.status().to_string()),
        ("Tasks", execution.progress()),
        ("Started", format_time(execution.start_time)),
        ("Completed", format_time(execution.completion_time)),
        ("Duration", duration),
        ("Logs", or_dash(execution.log_uri.as_deref())),
    ]
}

#[derive(Default)]
pub struct ExecutionHandler;

impl ExecutionHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: ExecutionCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            ExecutionCommands::List { job } => {
                let project = ctx.project()?;
                let executions = {
                    let _spinner = ctx.output.spinner(&format!("Listing executions of {}", job));
                    ctx.resources
                        .list_executions(project, ctx.regions(), &job)
                        .await?
                };
                ctx.output.list(&executions, "No executions found.")
            }
        }
    }
}

#[derive(Default)]
pub struct WorkerPoolHandler;

impl WorkerPoolHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: WorkerPoolCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            WorkerPoolCommands::List => {
                let project = ctx.project()?;
                let pools = {
                    let _spinner =
                        ctx.output.spinner(&format!("Listing worker pools in {}", ctx.regions()));
                    ctx.resources.list_worker_pools(project, ctx.regions()).await?
                };
                ctx.output.list(&pools, "No worker pools found.")
            }
            WorkerPoolCommands::Describe { name } => {
                let reference = ctx.reference(&name, ResourceKind::WorkerPool)?;
                let pool = ctx.resources.describe_worker_pool(&reference).await?;
                ctx.output.details(&pool, &worker_pool_details(&pool))
            }
            WorkerPoolCommands::Scale { name, instances } => {
                let instances = parse_instance_count("instances", &instances)?;
                let reference = ctx.reference(&name, ResourceKind::WorkerPool)?;

                let pool = {
                    let _spinner = ctx.output.spinner(&format!("Updating {}", reference.describe()));
                    ctx.resources.scale_worker_pool(&reference, instances).await?
                };
                ctx.output.message(&format!(
                    "Scaled {} to {} instances",
                    reference.describe(),
                    instances
                ));
                ctx.output.details(&pool, &worker_pool_details(&pool))
            }
            WorkerPoolCommands::Open { name } => {
                let reference = ctx.reference(&name, ResourceKind::WorkerPool)?;
                open_in_browser(&ctx.output, &console_url(&reference)?);
                Ok(())
            }
        }
    }
}

fn worker_pool_details(pool: &WorkerPool) -> Vec<(&'static str, String)> {
    vec![
        ("Name", pool.short_name.clone()),
        ("Region", pool.region.clone()),
        ("Status", pool.status().to_string()),
        (
            "Instances",
            pool.instance_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Image",
            or_dash(pool.containers.first().map(|c| c.image.as_str())),
        ),
        ("Latest Ready", or_dash(pool.latest_ready_revision.as_deref())),
        ("Creator", or_dash(pool.creator.as_deref())),
        ("Updated", format_time(pool.update_time)),
    ]
}

#[derive(Default)]
pub struct DomainMappingHandler;

impl DomainMappingHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: DomainMappingCommands,
        ctx: &CommandContext,
    ) -> Result<(), AppError> {
        match command {
            DomainMappingCommands::List => {
                let project = ctx.project()?;
                let mappings = {
                    let _spinner =
                        ctx.output.spinner(&format!("Listing domain mappings in {}", ctx.regions()));
                    ctx.resources
                        .list_domain_mappings(project, ctx.regions())
                        .await?
                };
                ctx.output.list(&mappings, "No domain mappings found.")
            }
        }
    }
}

#[derive(Default)]
pub struct ProjectHandler;

impl ProjectHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: ProjectCommands, ctx: &CommandContext) -> Result<(), AppError> {
        match command {
            ProjectCommands::List => {
                let projects = {
                    let _spinner = ctx.output.spinner("Listing projects");
                    ctx.resources.list_projects().await?
                };
                ctx.output.list(&projects, "No projects found.")
            }
        }
    }
}

#[derive(Serialize)]
struct RegionRow {
    region: String,
    default: bool,
}

impl TableRow for RegionRow {
    fn headers() -> Vec<&'static str> {
        vec!["Region", "Default"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.region.clone(),
            if self.default { "*".to_string() } else { String::new() },
        ]
    }
}

#[derive(Default)]
pub struct RegionHandler;

impl RegionHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, command: RegionCommands, output: &Output) -> Result<(), AppError> {
        match command {
            RegionCommands::List { filter } => {
                let regions = match filter.as_deref() {
                    Some(text) => region::filter(text).into_iter().map(str::to_string).collect(),
                    None => region::list(),
                };
                let rows: Vec<RegionRow> = regions
                    .into_iter()
                    .map(|r| RegionRow {
                        default: r == region::DEFAULT_REGION,
                        region: r,
                    })
                    .collect();
                output.list(&rows, "No matching regions.")
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoReport<'a> {
    gcloud: &'a GcloudInfo,
    project: Option<&'a str>,
    project_source: Option<SettingSource>,
    region: String,
    region_source: SettingSource,
    format: String,
    timeout_secs: u64,
    deadline_secs: Option<u64>,
    region_errors: String,
    config_file: Option<String>,
    access_token_env: bool,
}

#[derive(Default)]
pub struct InfoHandler;

impl InfoHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        settings: &Settings,
        gcloud: &GcloudInfo,
        config_path: Option<PathBuf>,
    ) -> Result<(), AppError> {
        let config_file = config_path
            .or_else(|| Config::config_file_path().ok())
            .map(|p| p.display().to_string());

        let report = InfoReport {
            gcloud,
            project: settings.project.as_ref().map(|p| p.value.as_str()),
            project_source: settings.project.as_ref().map(|p| p.source),
            region: settings.region.value.to_string(),
            region_source: settings.region.source,
            format: settings.format.to_string(),
            timeout_secs: settings.timeout_secs,
            deadline_secs: settings.deadline_secs,
            region_errors: settings.region_errors.to_string(),
            config_file,
            access_token_env: has_env_token(),
        };

        let project = match &settings.project {
            Some(p) => format!("{} ({})", p.value, p.source),
            None => "-".to_string(),
        };
        let fields = [
            ("gcloud Configuration", gcloud.configuration.clone()),
            ("gcloud Account", or_dash(gcloud.account.as_deref())),
            ("gcloud Project", or_dash(gcloud.project.as_deref())),
            (
                "gcloud Region",
                if gcloud.region_configured {
                    gcloud.region.clone()
                } else {
                    "-".to_string()
                },
            ),
            ("Project", project),
            (
                "Region",
                format!("{} ({})", settings.region.value, settings.region.source),
            ),
            ("Format", report.format.clone()),
            ("Timeout", format!("{}s", settings.timeout_secs)),
            (
                "Deadline",
                settings
                    .deadline_secs
                    .map(|d| format!("{}s", d))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            ("Region Errors", report.region_errors.clone()),
            ("Config File", or_dash(report.config_file.as_deref())),
            (
                "Access Token",
                if report.access_token_env {
                    "from environment".to_string()
                } else {
                    "gcloud".to_string()
                },
            ),
        ];

        Output::new(settings.format).details(&report, &fields)
    }
}

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        config_service: &mut ConfigService,
        config_path: Option<PathBuf>,
        options: &GlobalOptions,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                let format = options
                    .format
                    .as_deref()
                    .map(str::parse::<OutputFormat>)
                    .transpose()?
                    .or(config_service.config().format)
                    .unwrap_or_default();
                let entries = config_service.entries();
                let fields: Vec<(&str, String)> =
                    entries.iter().map(|(k, v)| (*k, v.clone())).collect();
                Output::new(format).details(config_service.config(), &fields)
            }
            ConfigCommands::Set {
                key,
                value,
                region_errors,
            } => {
                let mut updates: Vec<(String, String)> = Vec::new();

                match (key, value) {
                    (Some(key), Some(value)) => updates.push((key, value)),
                    (Some(key), None) => {
                        return Err(CliError::InvalidArguments(format!(
                            "missing value for '{}'. Usage: run-cli config set <KEY> <VALUE>",
                            key
                        ))
                        .into());
                    }
                    _ => {}
                }

                let flags = [
                    ("project", options.project.clone()),
                    ("region", options.region.clone()),
                    ("format", options.format.clone()),
                    ("timeout_secs", options.timeout.map(|t| t.to_string())),
                    ("deadline_secs", options.deadline.map(|t| t.to_string())),
                    ("region_errors", region_errors),
                ];
                for (flag, value) in flags {
                    if let Some(value) = value {
                        updates.push((flag.to_string(), value));
                    }
                }

                if updates.is_empty() {
                    return Err(CliError::InvalidArguments(
                        "No configuration values provided. Use 'run-cli config set <KEY> <VALUE>' or --project/--region/--format/--timeout/--deadline/--region-errors".to_string(),
                    )
                    .into());
                }

                for (key, value) in &updates {
                    config_service.set(key, value)?;
                }
                config_service.save_config(config_path)?;

                for (key, value) in &updates {
                    println!("Set {} = {}", key, value.trim());
                }
                println!("Configuration saved successfully.");
                Ok(())
            }
            ConfigCommands::Unset { key } => {
                config_service.unset(&key)?;
                config_service.save_config(config_path)?;
                println!("Unset {}", key);
                Ok(())
            }
        }
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
