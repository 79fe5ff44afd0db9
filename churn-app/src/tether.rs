//! Composition root: turns a [`ChurnConfig`] into concrete clients and runs commands.
use anyhow::{Context, Result};
use async_trait::async_trait;
use churn_config::ChurnConfig;
use churn_http::OAuth1Credentials;
use churn_social::Notifier;
use churn_social::twitter::TwitterApi;
use churn_tracker::{CronOrchestrator, CycleSettings, FixedDelay, Publisher, StateStore};
use churn_weather::{JapaneseCity, TsukumijimaApi, WeatherService};
use tracing::Instrument;
use uuid::Uuid;

/// Prints posts instead of sending them.
struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn post(&self, text: &str) -> churn_common::Result<()> {
        println!("----\n{text}");
        Ok(())
    }
}

pub struct Tether {
    cfg: ChurnConfig,
}

impl Tether {
    pub fn new(cfg: ChurnConfig) -> Self {
        Self { cfg }
    }

    fn city(&self, selector: Option<&str>) -> JapaneseCity {
        JapaneseCity::from_selector(selector.unwrap_or(&self.cfg.weather.city))
    }

    fn weather_api(&self) -> Result<TsukumijimaApi> {
        Ok(TsukumijimaApi::with_base_url(&self.cfg.weather.base_url)?)
    }

    fn twitter_api(&self) -> Result<TwitterApi> {
        let tw = &self.cfg.twitter;
        tw.validate().context("twitter credentials")?;
        let creds = OAuth1Credentials {
            consumer_key: tw.consumer_key.clone(),
            consumer_secret: tw.consumer_secret.clone(),
            access_token: tw.access_token.clone(),
            access_token_secret: tw.access_token_secret.clone(),
        };
        Ok(TwitterApi::with_base_url(&tw.base_url, creds)?)
    }

    pub async fn print_weather(&self, selector: Option<&str>) -> Result<()> {
        let city = self.city(selector);
        let line = self.weather_api()?.fetch_tomorrow_forecast(city).await?;
        println!("{city}: {line}");
        Ok(())
    }

    pub async fn run_cycle(&self, dry_run: bool) -> Result<()> {
        let span = tracing::info_span!("cycle", id = %Uuid::new_v4(), dry_run);
        self.cycle(dry_run).instrument(span).await
    }

    async fn cycle(&self, dry_run: bool) -> Result<()> {
        let started = chrono::Utc::now();
        let cycle_cfg = &self.cfg.cycle;
        let orch = CronOrchestrator::new(
            self.twitter_api()?,
            self.weather_api()?,
            StateStore::new(&self.cfg.state.path),
            Box::new(FixedDelay::from_millis(cycle_cfg.page_delay_ms)),
            CycleSettings {
                city: self.city(None),
                lookup_batch_size: cycle_cfg.lookup_batch_size,
            },
        );

        let mut cycle = orch.begin();
        tracing::info!(
            state=%orch.store().path().display(),
            previous_runs = cycle.previous().success_count,
            "app.cycle_start"
        );
        orch.update(&mut cycle).await?;
        let report = orch.report(&mut cycle)?;

        let post_delay = FixedDelay::from_millis(cycle_cfg.post_delay_ms);
        let summary = if dry_run {
            Publisher::new(&StdoutNotifier, orch.api(), &post_delay)
                .with_hashtag(&self.cfg.twitter.hashtag)
                .with_followed_posts(cycle_cfg.post_followed)
                .publish(&report)
                .await?
        } else {
            Publisher::new(orch.api(), orch.api(), &post_delay)
                .with_hashtag(&self.cfg.twitter.hashtag)
                .with_followed_posts(cycle_cfg.post_followed)
                .publish(&report)
                .await?
        };

        let weather = orch.refresh_weather(&mut cycle).await?;
        if dry_run {
            println!("----\nnext weather: {}", weather.text());
            tracing::info!(posts = summary.posts, "app.dry_run_done_state_untouched");
            return Ok(());
        }

        let saved = orch.save(&mut cycle)?;
        let elapsed = chrono::Utc::now() - started;
        tracing::info!(
            success_count = saved.success_count,
            followers = saved.follower_ids.len(),
            posts = summary.posts,
            blocked = summary.blocked,
            elapsed_ms = elapsed.num_milliseconds(),
            "app.cycle_done"
        );
        Ok(())
    }
}
