//! CLI application handler
//!
//! Wires the engine to file storage, the Nominatim geocoder and the console
//! stand-ins, then executes one subcommand.
use std::{path::PathBuf, sync::Arc};

use chrono::Local;
use console::style;
use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::{
    lookup, parse_coords, AttemptOutcome, Commands, Config, ConsoleMap, ConsolePresenter, Engine,
    FileBlobStore, Geocoder, Location, NominatimGeocoder, Result,
};

/// CLI Application handler - processes CLI commands against the engine
pub struct App {
    /// The location engine, owned by the task running the CLI
    engine: Engine,

    /// Reverse geocoder shared with in-flight lookups
    geocoder: Arc<dyn Geocoder>,

    /// Application configuration
    config: Config,

    /// Where the configuration is read from and written to
    config_path: PathBuf,
}

impl App {
    /// Builds the production wiring and loads stored locations.
    pub fn new(config: Config, config_path: PathBuf) -> Result<Self> {
        let geocoder =
            NominatimGeocoder::new(config.geocoder_url.clone(), &config.get_user_agent())?;
        let engine = Engine::new(
            config.engine_settings(),
            Box::new(FileBlobStore::new(config.data_dir.clone())),
            Box::new(ConsoleMap::default()),
            Box::new(ConsolePresenter),
        );

        Ok(Self::with_parts(engine, Arc::new(geocoder), config, config_path))
    }

    /// Assembles an app from ready-made parts and starts the engine.
    pub fn with_parts(
        mut engine: Engine,
        geocoder: Arc<dyn Geocoder>,
        config: Config,
        config_path: PathBuf,
    ) -> Self {
        engine.start();
        Self {
            engine,
            geocoder,
            config,
            config_path,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { points } => {
                self.add_points(&points).await?;
            }
            Commands::List { json } => self.list_locations(json)?,
            Commands::Show { id } => self.show_location(&id)?,
            Commands::Delete { id } => {
                self.engine.delete_location(&id)?;
            }
            Commands::Config { show, reset } => self.handle_config(show, reset)?,
        }

        Ok(())
    }

    /// Looks up every point concurrently and commits results as they arrive.
    ///
    /// Lookups run on spawned tasks; only this task touches the engine, so
    /// each commit completes before the next result is handled.
    async fn add_points(&mut self, points: &[String]) -> Result<usize> {
        let coords = points
            .iter()
            .map(|point| parse_coords(point))
            .collect::<Result<Vec<_>>>()?;

        let (result_tx, mut result_rx) = mpsc::channel(coords.len().max(1));
        let timeout = self.engine.settings().lookup_timeout;

        for point in coords {
            let attempt = self.engine.begin_acquisition(point);
            let geocoder = Arc::clone(&self.geocoder);
            let result_tx = result_tx.clone();

            tokio::spawn(async move {
                let result = lookup(geocoder.as_ref(), attempt.coords(), timeout).await;
                if result_tx.send((attempt, result)).await.is_err() {
                    error!(
                        "Result of acquisition #{} arrived after shutdown",
                        attempt.generation()
                    );
                }
            });
        }
        drop(result_tx);

        let mut committed = 0;
        while let Some((attempt, result)) = result_rx.recv().await {
            match self.engine.finish_acquisition(attempt, result) {
                AttemptOutcome::Committed(_) => committed += 1,
                AttemptOutcome::Failed(e) => debug!("Acquisition failed: {}", e),
                AttemptOutcome::Discarded { generation } => {
                    debug!("Acquisition #{} discarded", generation)
                }
            }
        }

        info!("{} of {} points added", committed, points.len());
        Ok(committed)
    }

    fn list_locations(&self, json: bool) -> Result<()> {
        let locations = self.engine.locations();

        if json {
            println!("{}", serde_json::to_string_pretty(locations)?);
            return Ok(());
        }

        if locations.is_empty() {
            println!("No locations marked yet.");
            return Ok(());
        }

        for (i, location) in locations.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(40));
            }
            print_location(location);
        }

        Ok(())
    }

    fn show_location(&mut self, id: &str) -> Result<()> {
        let location = self.engine.focus(id)?;
        print_location(location);
        Ok(())
    }

    fn handle_config(&mut self, show: bool, reset: bool) -> Result<()> {
        if reset {
            self.config = Config::default();
            self.config.save(&self.config_path)?;
            println!("Configuration reset: {}", self.config_path.display());
        }

        if show || !reset {
            println!("# {}", self.config_path.display());
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }

        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

fn print_location(location: &Location) {
    println!("{}", location_header(location));
    println!("{}", style(location.display_label()).bold());
    println!("At: {}", location.coords());
    if !location.description().is_empty() {
        println!("Location details: {}.", location.description());
    }
}

// Local time, the same zone the display label's day comes from.
fn location_header(location: &Location) -> String {
    format!(
        "ID: {} | Created: {}",
        location.id(),
        location
            .created_at()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::testing::{FixedGeocoder, RecordingMap, RecordingPresenter};
    use crate::{EngineSettings, MemoryBlobStore, PinError};

    fn test_app(geocoder: FixedGeocoder, blobs: MemoryBlobStore) -> App {
        let engine = Engine::new(
            EngineSettings::default(),
            Box::new(blobs),
            Box::new(RecordingMap::ready()),
            Box::new(RecordingPresenter::default()),
        );
        App::with_parts(
            engine,
            Arc::new(geocoder),
            Config::default(),
            PathBuf::from("unused.json"),
        )
    }

    #[tokio::test]
    async fn add_commits_every_point() {
        let blobs = MemoryBlobStore::new();
        let mut app = test_app(FixedGeocoder::found("France", "Paris"), blobs.clone());

        let added = app
            .add_points(&["48.85,2.35".to_string(), "43.3,5.4".to_string()])
            .await
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(app.engine().locations().len(), 2);
        assert_eq!(app.engine().marker_count(), 2);
        assert_eq!(app.engine().pending_lookups(), 0);

        let mut reloaded = test_app(FixedGeocoder::found("", ""), blobs);
        assert_eq!(reloaded.engine().locations().len(), 2);
        reloaded.run(Commands::List { json: true }).await.unwrap();
    }

    #[tokio::test]
    async fn add_with_failing_lookup_adds_nothing() {
        let mut app = test_app(FixedGeocoder::failing("Unable to geocode"), MemoryBlobStore::new());

        let added = app.add_points(&["0,0".to_string()]).await.unwrap();

        assert_eq!(added, 0);
        assert!(app.engine().locations().is_empty());
    }

    #[tokio::test]
    async fn add_rejects_bad_input_before_any_lookup() {
        let mut app = test_app(FixedGeocoder::found("X", ""), MemoryBlobStore::new());

        let result = app
            .add_points(&["1,1".to_string(), "north".to_string()])
            .await;

        assert!(matches!(result, Err(PinError::InvalidCoords { .. })));
        assert_eq!(app.engine().pending_lookups(), 0);
    }

    #[test]
    fn header_uses_the_same_day_as_the_label() {
        let created_at = chrono::Utc.with_ymd_and_hms(2024, 3, 7, 23, 45, 0).unwrap();
        let location = Location::reconstruct(
            "a".to_string(),
            crate::Coords::new(48.85, 2.35),
            "France".to_string(),
            String::new(),
            created_at,
            None,
        );

        let local = created_at.with_timezone(&Local);
        assert_eq!(
            location_header(&location),
            format!("ID: a | Created: {}", local.format("%Y-%m-%d %H:%M"))
        );
        assert!(location
            .display_label()
            .ends_with(&local.format("%b, %-d").to_string()));
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_reported() {
        let mut app = test_app(FixedGeocoder::found("X", ""), MemoryBlobStore::new());

        let result = app.run(Commands::Delete { id: "nope".to_string() }).await;

        assert!(matches!(result, Err(PinError::NotFound { .. })));
    }
}
