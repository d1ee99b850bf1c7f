use crate::cli::command_handlers::{
    CommandContext, ConfigHandler, DomainMappingHandler, ExecutionHandler, InfoHandler,
    JobHandler, ProjectHandler, RegionHandler, RevisionHandler, ServiceHandler, WorkerPoolHandler,
};
use crate::cli::main_types::Commands;
use crate::cli::output::Output;
use run_core::api::client::RunClient;
use run_core::core::services::config_service::ConfigService;
use run_core::core::services::resource_service::ResourceService;
use run_core::core::services::settings::{Overrides, Settings};
use run_core::display::OutputFormat;
use run_core::error::AppError;
use run_core::storage::config::Config;
use run_core::storage::credentials::provider_for;
use run_core::storage::gcloud::GcloudInfo;
use std::path::PathBuf;

/// Global flags that apply to every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub project: Option<String>,
    pub region: Option<String>,
    pub format: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Option<u64>,
    pub deadline: Option<u64>,
}

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    options: GlobalOptions,
}

impl Dispatcher {
    pub fn new(config: Config, config_path: Option<PathBuf>, options: GlobalOptions) -> Self {
        Self {
            config,
            config_path,
            options,
        }
    }

    fn overrides(&self) -> Result<Overrides, AppError> {
        let format = self
            .options
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()?;

        Ok(Overrides {
            project: self.options.project.clone(),
            region: self.options.region.clone(),
            format,
            timeout_secs: self.options.timeout,
            deadline_secs: self.options.deadline,
        })
    }

    fn resolve_settings(&self, gcloud: &GcloudInfo) -> Result<Settings, AppError> {
        let settings = Settings::resolve(&self.overrides()?, &self.config, gcloud)?;
        log::debug!(
            "Resolved region {} ({}), format {}, timeout {}s, deadline {:?}",
            settings.region.value,
            settings.region.source,
            settings.format,
            settings.timeout_secs,
            settings.deadline_secs
        );
        Ok(settings)
    }

    fn create_resource_service(&self, settings: &Settings) -> Result<ResourceService, AppError> {
        let client = RunClient::new(provider_for(self.options.access_token.as_deref()))?
            .with_timeout(settings.timeout_secs)?
            .with_retry(settings.retry_executor())
            .with_poll_settings(settings.poll_settings());
        Ok(ResourceService::new(client)
            .with_fanout(settings.fanout())
            .with_policy(settings.region_errors))
    }

    fn create_context(&self) -> Result<CommandContext, AppError> {
        let settings = self.resolve_settings(&GcloudInfo::load())?;
        let resources = self.create_resource_service(&settings)?;
        let output = Output::new(settings.format);
        Ok(CommandContext::new(settings, resources, output))
    }

    fn create_config_service(&self) -> ConfigService {
        ConfigService::new(self.config.clone())
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Config { command } => {
                // Config commands work without a project or credentials.
                let mut config_service = self.create_config_service();
                ConfigHandler::new().handle(
                    command,
                    &mut config_service,
                    self.config_path.clone(),
                    &self.options,
                )
            }
            Commands::Region { command } => {
                let settings = self.resolve_settings(&GcloudInfo::load())?;
                RegionHandler::new().handle(command, &Output::new(settings.format))
            }
            Commands::Info => {
                let gcloud = GcloudInfo::load();
                let settings = self.resolve_settings(&gcloud)?;
                InfoHandler::new().handle(&settings, &gcloud, self.config_path.clone())
            }
            Commands::Project { command } => {
                let context = self.create_context()?;
                ProjectHandler::new().handle(command, &context).await
            }
            Commands::Service { command } => {
                let context = self.create_context()?;
                ServiceHandler::new().handle(command, &context).await
            }
            Commands::Revision { command } => {
                let context = self.create_context()?;
                RevisionHandler::new().handle(command, &context).await
            }
            Commands::Job { command } => {
                let context = self.create_context()?;
                JobHandler::new().handle(command, &context).await
            }
            Commands::Execution { command } => {
                let context = self.create_context()?;
                ExecutionHandler::new().handle(command, &context).await
            }
            Commands::WorkerPool { command } => {
                let context = self.create_context()?;
                WorkerPoolHandler::new().handle(command, &context).await
            }
            Commands::DomainMapping { command } => {
                let context = self.create_context()?;
                DomainMappingHandler::new().handle(command, &context).await
            }
        }
    }
}
