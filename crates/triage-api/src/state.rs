use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;
use triage_core::{Format, LogSource, OutputParser, ParsedAnalysis, ParserRegistry};
use triage_llm::{AnalysisEngine, ProgressTracker};
use uuid::Uuid;

pub const SAMPLE_INCIDENT: &str = include_str!("../../../sample-data/sample_incident.log");

/// Finished jobs are kept this long after they finish
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(60 * 60);
/// At most this many finished jobs are kept; the oldest go first
pub const DEFAULT_MAX_FINISHED_JOBS: usize = 256;

/// How a finished job ended
#[derive(Clone, Debug)]
pub enum JobOutcome {
    Completed(ParsedAnalysis),
    Failed(String),
}

/// One uploaded log and its analysis
#[derive(Clone, Debug)]
pub struct Job {
    pub filename: String,
    pub format: Format,
    pub created_at: String,
    pub tracker: ProgressTracker,
    pub outcome: Option<JobOutcome>,
    pub finished_at: Option<Instant>,
}

impl Job {
    pub fn new(source: &LogSource, tracker: ProgressTracker) -> Self {
        Self {
            filename: source.name.clone(),
            format: source.format,
            created_at: Utc::now().to_rfc3339(),
            tracker,
            outcome: None,
            finished_at: None,
        }
    }
}

pub struct AppState {
    pub engine: AnalysisEngine,
    pub parser_registry: ParserRegistry,
    pub output_parser: OutputParser,
    pub jobs: RwLock<HashMap<Uuid, Job>>,
    pub job_ttl: Duration,
    pub max_finished_jobs: usize,
}

impl AppState {
    pub fn new(engine: AnalysisEngine, parser_registry: ParserRegistry) -> Self {
        Self {
            engine,
            parser_registry,
            output_parser: OutputParser::new(),
            jobs: RwLock::new(HashMap::new()),
            job_ttl: DEFAULT_JOB_TTL,
            max_finished_jobs: DEFAULT_MAX_FINISHED_JOBS,
        }
    }

    pub fn with_job_retention(mut self, ttl: Duration, max_finished: usize) -> Self {
        self.job_ttl = ttl;
        self.max_finished_jobs = max_finished;
        self
    }

    /// Parse, analyze and split one log into sections
    pub async fn analyze_source(&self, source: &LogSource, tracker: &ProgressTracker) -> JobOutcome {
        let canonical = self.parser_registry.parse_source(source).into_text();
        match self.engine.run(&canonical, Some(tracker)).await {
            Ok(report) => JobOutcome::Completed(self.output_parser.parse(&report.text)),
            Err(e) => JobOutcome::Failed(self.engine.describe_error(&e)),
        }
    }

    /// Store a new job, evicting expired finished jobs first
    pub fn insert_job(&self, id: Uuid, job: Job) {
        let mut jobs = self.jobs.write().unwrap();
        self.evict_finished(&mut jobs, Instant::now());
        jobs.insert(id, job);
    }

    pub fn finish_job(&self, id: Uuid, outcome: JobOutcome) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            job.outcome = Some(outcome);
            job.finished_at = Some(Instant::now());
        }
    }

    pub fn job(&self, id: &Uuid) -> Option<Job> {
        let jobs = self.jobs.read().unwrap();
        jobs.get(id).cloned()
    }

    // Running jobs are never evicted
    fn evict_finished(&self, jobs: &mut HashMap<Uuid, Job>, now: Instant) {
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at {
            Some(finished) => now.duration_since(finished) < self.job_ttl,
            None => true,
        });

        let mut finished: Vec<(Instant, Uuid)> = jobs
            .iter()
            .filter_map(|(id, job)| job.finished_at.map(|at| (at, *id)))
            .collect();
        if finished.len() > self.max_finished_jobs {
            finished.sort();
            let excess = finished.len() - self.max_finished_jobs;
            for (_, id) in finished.into_iter().take(excess) {
                jobs.remove(&id);
            }
        }

        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!(evicted, remaining = jobs.len(), "Evicted finished analysis jobs");
        }
    }
}
