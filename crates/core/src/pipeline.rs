use crate::config::RunConfig;
use crate::domain::outfit::Outfit;
use crate::ingest::closet::WardrobeStore;
use crate::ingest::open_meteo::WeatherProvider;
use crate::llm::{GenerationRequest, Generator};
use crate::notify::sms::Messenger;
use crate::outfit::exclusion::HistoryDigest;
use crate::outfit::parser::parse_outfit;
use crate::outfit::scorer::{score_response, ScoreReport};
use crate::outfit::prompt;
use crate::time;
use anyhow::Context;
use chrono::Utc;

/// The four external collaborators the run needs. Production wires HTTP
/// clients in; tests substitute doubles.
pub struct Collaborators {
    pub weather: Box<dyn WeatherProvider>,
    pub store: Box<dyn WardrobeStore>,
    pub generator: Box<dyn Generator>,
    pub messenger: Box<dyn Messenger>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after scoring: no SMS, no history write.
    pub dry_run: bool,
    /// Persist history but skip the SMS send.
    pub skip_sms: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub recommendation: String,
    pub outfit: Outfit,
    pub report: ScoreReport,
    pub sms_sent: bool,
}

/// One end-to-end run: weather and wardrobe in, recommendation out.
/// Scoring is advisory; a failing report is logged but the message is
/// still delivered and recorded.
pub async fn run(
    deps: &Collaborators,
    config: &RunConfig,
    options: RunOptions,
) -> anyhow::Result<RunOutcome> {
    let weather = deps
        .weather
        .fetch_weather()
        .await
        .context("failed to fetch weather")?;
    tracing::info!(
        high_c = weather.high_c,
        rain = weather.daily_rain_chance_percent,
        uv = weather.uv_index,
        conditions = %weather.conditions,
        "weather fetched"
    );

    let wardrobe = deps
        .store
        .fetch_wardrobe()
        .await
        .context("failed to fetch wardrobe")?;
    let history = deps
        .store
        .fetch_history(config.lookback_days)
        .await
        .context("failed to fetch outfit history")?;
    tracing::info!(
        wardrobe_items = wardrobe.len(),
        history_entries = history.len(),
        "closet fetched"
    );

    let digest = HistoryDigest::build(&wardrobe, &history, config.lookback_days);
    if !digest.excluded_tops.is_empty() {
        tracing::info!(excluded = ?digest.excluded_tops, "tops excluded for this run");
    }

    let rendered = prompt::render(&weather, &wardrobe, &digest, config);
    let request = GenerationRequest::new(rendered);
    let raw = deps
        .generator
        .generate(&request)
        .await
        .context("recommendation generation failed")?;

    let recommendation = truncate_for_sms(&raw, config.sms.max_chars);
    if recommendation.len() < raw.len() {
        tracing::warn!(
            raw_chars = raw.chars().count(),
            limit = config.sms.max_chars,
            "recommendation truncated for sms"
        );
    }

    let outfit = parse_outfit(&recommendation);
    let report = score_response(
        &recommendation,
        &weather,
        &digest.excluded_tops,
        &wardrobe,
        config,
    );
    for score in &report.scores {
        tracing::debug!(rule = score.name, score = score.score, "rule scored");
    }
    if !report.pass {
        let failing: Vec<&str> = report.failing().map(|s| s.name).collect();
        tracing::warn!(?failing, "recommendation failed rule checks, sending anyway");
    }

    if options.dry_run {
        tracing::info!("dry run, skipping sms and history write");
        return Ok(RunOutcome {
            recommendation,
            outfit,
            report,
            sms_sent: false,
        });
    }

    let mut sms_sent = false;
    if options.skip_sms {
        tracing::info!("sms send skipped by request");
    } else {
        deps.messenger
            .send(&recommendation)
            .await
            .context("failed to send sms")?;
        sms_sent = true;
    }

    let today = time::local_date(&config.location, Utc::now())?;
    deps.store
        .append_history(today, &outfit)
        .await
        .context("failed to record outfit history")?;
    tracing::info!(%today, sms_sent, "run recorded");

    Ok(RunOutcome {
        recommendation,
        outfit,
        report,
        sms_sent,
    })
}

/// Hard cap for the SMS body, counted in characters rather than bytes.
/// Over-length text keeps the first `max_chars - 3` characters plus "...".
pub fn truncate_for_sms(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outfit::HistoryEntry;
    use crate::domain::wardrobe::{Category, WardrobeItem};
    use crate::domain::weather::Weather;
    use crate::llm::Provider;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    struct FixedWeather(Weather);

    #[async_trait::async_trait]
    impl WeatherProvider for FixedWeather {
        async fn fetch_weather(&self) -> Result<Weather> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        wardrobe: Vec<WardrobeItem>,
        history: Vec<HistoryEntry>,
        appended: Arc<Mutex<Vec<(NaiveDate, Outfit)>>>,
    }

    #[async_trait::async_trait]
    impl WardrobeStore for MemoryStore {
        async fn fetch_wardrobe(&self) -> Result<Vec<WardrobeItem>> {
            Ok(self.wardrobe.clone())
        }

        async fn fetch_history(&self, _lookback_days: i64) -> Result<Vec<HistoryEntry>> {
            Ok(self.history.clone())
        }

        async fn append_history(&self, date: NaiveDate, outfit: &Outfit) -> Result<()> {
            self.appended
                .lock()
                .unwrap()
                .push((date, outfit.clone()));
            Ok(())
        }
    }

    struct CannedGenerator(String);

    #[async_trait::async_trait]
    impl Generator for CannedGenerator {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait::async_trait]
    impl Generator for FailingGenerator {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            anyhow::bail!("provider unavailable")
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(&self, message: &str) -> Result<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn warm_weather() -> Weather {
        Weather {
            temperature_c: 26.0,
            feels_like_c: 27.0,
            humidity_percent: 55.0,
            wind_speed_kmh: 10.0,
            rain_chance_percent: 10.0,
            conditions: "Clear sky".to_string(),
            high_c: 28.0,
            low_c: 19.0,
            daily_rain_chance_percent: 10.0,
            uv_index: 5.0,
            local_time: "7:30 AM".to_string(),
            date_formatted: "Friday 24 Jan".to_string(),
        }
    }

    fn small_wardrobe() -> Vec<WardrobeItem> {
        let mk = |item: &str, category: Category| WardrobeItem {
            item: item.to_string(),
            category,
            pillar: None,
            quantity: 1,
            description: None,
        };
        vec![
            mk("Whitesville Tee", Category::Top),
            mk("OrSlow 105 Jeans", Category::Bottom),
            mk("Converse Chuck 70", Category::Shoes),
        ]
    }

    fn canned_response() -> String {
        "Good morning Peter, it is Friday 24 Jan in Sydney.\n\
Clear and warm today.\n\n\
Top: Whitesville Tee\nBottom: OrSlow 105 Jeans\nShoes: Converse Chuck 70"
            .to_string()
    }

    fn deps(
        generator: Box<dyn Generator>,
    ) -> (
        Collaborators,
        Arc<Mutex<Vec<(NaiveDate, Outfit)>>>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let appended = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let collaborators = Collaborators {
            weather: Box::new(FixedWeather(warm_weather())),
            store: Box::new(MemoryStore {
                wardrobe: small_wardrobe(),
                history: Vec::new(),
                appended: Arc::clone(&appended),
            }),
            generator,
            messenger: Box::new(RecordingMessenger {
                sent: Arc::clone(&sent),
            }),
        };
        (collaborators, appended, sent)
    }

    #[tokio::test]
    async fn happy_path_sends_sms_and_records_history() {
        let (collaborators, appended, sent) =
            deps(Box::new(CannedGenerator(canned_response())));

        let outcome = run(&collaborators, &RunConfig::default(), RunOptions::default())
            .await
            .unwrap();

        assert!(outcome.sms_sent);
        assert!(outcome.report.pass);
        assert_eq!(outcome.outfit.top.as_deref(), Some("Whitesville Tee"));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], canned_response());
        assert_eq!(appended.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generation_failure_has_no_side_effects() {
        let (collaborators, appended, sent) = deps(Box::new(FailingGenerator));

        let err = run(&collaborators, &RunConfig::default(), RunOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("generation failed"));
        assert!(sent.lock().unwrap().is_empty());
        assert!(appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_scores_but_never_sends_or_records() {
        let (collaborators, appended, sent) =
            deps(Box::new(CannedGenerator(canned_response())));

        let outcome = run(
            &collaborators,
            &RunConfig::default(),
            RunOptions {
                dry_run: true,
                skip_sms: false,
            },
        )
        .await
        .unwrap();

        assert!(!outcome.sms_sent);
        assert!(outcome.report.pass);
        assert!(sent.lock().unwrap().is_empty());
        assert!(appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skip_sms_still_records_history() {
        let (collaborators, appended, sent) =
            deps(Box::new(CannedGenerator(canned_response())));

        let outcome = run(
            &collaborators,
            &RunConfig::default(),
            RunOptions {
                dry_run: false,
                skip_sms: true,
            },
        )
        .await
        .unwrap();

        assert!(!outcome.sms_sent);
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(appended.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn over_length_response_is_truncated_before_send() {
        let mut long = canned_response();
        long.push_str(&"x".repeat(600));
        let (collaborators, _appended, sent) = deps(Box::new(CannedGenerator(long)));

        let outcome = run(&collaborators, &RunConfig::default(), RunOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.recommendation.chars().count(), 480);
        assert!(outcome.recommendation.ends_with("..."));
        assert_eq!(sent.lock().unwrap()[0], outcome.recommendation);
        // The truncated text still fits, so the char-limit rule passes.
        let limit = outcome
            .report
            .scores
            .iter()
            .find(|s| s.name == "under_char_limit")
            .unwrap();
        assert_eq!(limit.score, 1.0);
    }

    #[test]
    fn truncate_is_noop_at_or_under_the_limit() {
        assert_eq!(truncate_for_sms("short", 480), "short");
        let exact: String = "a".repeat(480);
        assert_eq!(truncate_for_sms(&exact, 480), exact);
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text: String = "é".repeat(500);
        let out = truncate_for_sms(&text, 480);
        assert_eq!(out.chars().count(), 480);
        assert!(out.ends_with("..."));
    }
}
