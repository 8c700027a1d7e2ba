use std::path::{Path, PathBuf};
use std::sync::Arc;

use coleta::classifier::{LogisticRelevanceClassifier, ModelStore};
use coleta::cli::{CandidatesAction, Cli, Commands, ConfigAction};
use coleta::config::{expand_tilde, Config};
use coleta::error::{ColetaError, Result};
use coleta::matching::{NeedQuery, RecommendedPoint};
use coleta::storage::Database;
use coleta::vocabulary::{SynonymMap, BUILTIN_VOCABULARY};
use coleta::{Candidate, RecommendationService};

type Service = RecommendationService<LogisticRelevanceClassifier>;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Recommend { need, city, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_recommend(&config, &need, city.as_deref(), json)?;
        }
        Commands::Best { need, city, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_best(&config, &need, city.as_deref(), json)?;
        }
        Commands::Retrain => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_retrain(&config)?;
        }
        Commands::Status => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_status(&config)?;
        }
        Commands::Candidates { action } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_candidates(&config, action)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "coleta=debug" } else { "coleta=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries command output, logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(config: &Config) -> Result<Arc<Database>> {
    Ok(Arc::new(Database::new(&config.storage.database_path())?))
}

fn load_vocabulary(config: &Config) -> Result<SynonymMap> {
    let vocabulary = match &config.vocabulary.synonyms_file {
        Some(path) => SynonymMap::from_file(&expand_tilde(path))?,
        None => SynonymMap::builtin()?,
    };
    Ok(vocabulary)
}

fn build_service(config: &Config, database: Arc<Database>) -> Result<Service> {
    let vocabulary = load_vocabulary(config)?;
    let classifier = LogisticRelevanceClassifier::new(&config.classifier)?;
    let store = ModelStore::new(config.storage.model_path());

    Ok(RecommendationService::new(
        Arc::new(vocabulary),
        config.scoring.clone(),
        database,
        classifier,
        Some(store),
    ))
}

fn ready_service(config: &Config) -> Result<Service> {
    let service = build_service(config, open_database(config)?)?;
    let status = service.initialize()?;
    if !status.ready {
        tracing::warn!("No collection points stored yet. Run 'coleta candidates import' first.");
    }
    Ok(service)
}

fn cmd_recommend(config: &Config, need: &str, city: Option<&str>, json: bool) -> Result<()> {
    let query = NeedQuery::new(need, city)?;
    let service = ready_service(config)?;
    let recommendation = service.recommend(&query)?;
    let points = recommendation.points();

    if json {
        println!("{}", to_json(&points)?);
        return Ok(());
    }

    if recommendation.degraded {
        println!("Relevance model not ready, no recommendations available");
        return Ok(());
    }

    if points.is_empty() {
        println!("No collection points found for '{}'", query.need());
        return Ok(());
    }

    println!("Recommendations for '{}':", query.need());
    for (rank, point) in points.iter().enumerate() {
        print_point(rank + 1, point);
    }

    Ok(())
}

fn cmd_best(config: &Config, need: &str, city: Option<&str>, json: bool) -> Result<()> {
    let query = NeedQuery::new(need, city)?;
    let service = ready_service(config)?;

    match service.best(&query)? {
        Some(best) => {
            let point = RecommendedPoint::from(&best);
            if json {
                println!("{}", to_json(&point)?);
            } else {
                print_point(1, &point);
            }
        }
        None => {
            if json {
                println!("null");
            } else {
                println!("No collection point found for '{}'", query.need());
            }
        }
    }

    Ok(())
}

fn cmd_retrain(config: &Config) -> Result<()> {
    let service = build_service(config, open_database(config)?)?;
    let report = service.retrain()?;

    println!("✓ Relevance model retrained");
    println!("  Collection points: {}", report.candidates);
    println!(
        "  Examples: {} ({} positive, {} negative)",
        report.examples, report.positives, report.negatives
    );
    println!("  Fingerprint: {}", report.fingerprint);
    println!("  Trained at: {}", report.trained_at.to_rfc3339());

    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let database = open_database(config)?;
    let stats = database.stats()?;

    let service = build_service(config, database)?;
    let status = service.initialize()?;

    println!("Collection points:");
    println!("  Total: {}", stats.candidate_count);
    println!("  Active: {}", stats.active_count);
    println!("  Cities: {}", stats.city_count);

    println!("Relevance model:");
    if status.ready {
        println!("  Status: ready");
        if let Some(fingerprint) = &status.fingerprint {
            println!("  Fingerprint: {}", fingerprint);
        }
        if let Some(trained_at) = status.trained_at {
            println!("  Trained at: {}", trained_at.to_rfc3339());
        }
        println!("  Examples: {}", status.examples);
    } else {
        println!("  Status: not ready");
    }
    println!("  File: {}", config.storage.model_path().display());
    println!("Vocabulary: v{}", service.vocabulary().version());

    Ok(())
}

fn cmd_candidates(config: &Config, action: CandidatesAction) -> Result<()> {
    let database = open_database(config)?;

    match action {
        CandidatesAction::Import { file } => {
            let content = std::fs::read_to_string(&file).map_err(|e| ColetaError::Io {
                source: e,
                context: format!("Failed to read candidates file: {:?}", file),
            })?;
            let candidates: Vec<Candidate> =
                serde_json::from_str(&content).map_err(|e| ColetaError::Json {
                    source: e,
                    context: format!("Failed to parse candidates file: {:?}", file),
                })?;

            let imported = database.import_candidates(&candidates)?;
            println!("✓ Imported {} collection points", imported);
            println!("  Run 'coleta retrain' to refresh the relevance model");
        }
        CandidatesAction::List { city } => {
            let candidates = database.list_candidates(city.as_deref())?;
            if candidates.is_empty() {
                println!("No collection points stored");
            }
            for c in candidates {
                let marker = if c.active { " " } else { "x" };
                println!(
                    "[{}] {:>5}  {:<18} {:<16} {}",
                    marker, c.id, c.kind, c.city, c.stock
                );
            }
        }
        CandidatesAction::Show { id } => match database.get_candidate(id)? {
            Some(candidate) => println!("{}", to_json(&candidate)?),
            None => println!("No collection point with id {}", id),
        },
        CandidatesAction::Activate { id } => set_active(&database, id, true)?,
        CandidatesAction::Deactivate { id } => set_active(&database, id, false)?,
    }

    Ok(())
}

fn set_active(database: &Database, id: i64, active: bool) -> Result<()> {
    if !database.set_active(id, active)? {
        println!("No collection point with id {}", id);
        return Ok(());
    }

    let state = if active { "activated" } else { "deactivated" };
    println!("✓ Collection point {} {}", id, state);
    println!("  Run 'coleta retrain' to refresh the relevance model");
    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            println!("{}", to_json(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&config_dir).map_err(|e| ColetaError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", config_dir),
            })?;

            let synonyms_path = config_dir.join("synonyms.toml");
            if force || !synonyms_path.exists() {
                std::fs::write(&synonyms_path, BUILTIN_VOCABULARY).map_err(|e| {
                    ColetaError::Io {
                        source: e,
                        context: format!("Failed to write vocabulary: {:?}", synonyms_path),
                    }
                })?;
            }

            let mut config = Config::default();
            config.vocabulary.synonyms_file = Some(synonyms_path);
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("✓ Vocabulary installed next to it (synonyms.toml)");
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'coleta config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        coleta::config::ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    match profile {
        Some(profile) => Config::load_with_profile(&path, &profile),
        None => Config::load(&path),
    }
}

fn print_point(rank: usize, point: &RecommendedPoint) {
    println!(
        "{:>2}. [{:>5.1}] #{} {} - {}",
        rank, point.score, point.id, point.kind, point.city
    );
    let address: Vec<&str> = [point.street.as_str(), point.district.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !address.is_empty() {
        println!("      {}", address.join(", "));
    }
    if !point.description.is_empty() {
        println!("      {}", point.description);
    }
    if !point.stock.is_empty() {
        println!("      Stock: {}", point.stock);
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ColetaError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })
}
