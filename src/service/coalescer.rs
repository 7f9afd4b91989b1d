//! Coalescing task writer
//!
//! Reconciliation passes hand their create and update sets to this writer
//! instead of writing directly. Each lane keeps only the latest submission
//! per author and writes them once the lane has been quiet for the debounce window, so a
//! burst of passes ends in one batch per lane. Batches are atomic; a failed
//! batch is reported and dropped, the next pass submits again.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Duration, Instant};

use crate::domain::{DomainError, DomainResult, TaskFilter, TaskFrequency, UserTask};
use crate::repository::{Repository, WriteBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

impl WriteKind {
    fn verb(self) -> &'static str {
        match self {
            WriteKind::Create => "Generated",
            WriteKind::Update => "Updated",
        }
    }
}

/// Tasks written by one explicit flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub created: usize,
    pub updated: usize,
}

/// Running totals, observable through [`CoalescingWriter::status`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStatus {
    pub commits: u64,
    pub created: u64,
    pub updated: u64,
    /// Error of the most recent failed batch, cleared by the next success
    pub last_error: Option<DomainError>,
}

enum Command {
    Submit(WriteKind, String, Vec<UserTask>),
    Flush(oneshot::Sender<DomainResult<FlushReport>>),
}

/// Latest submission per author, written together when the window closes
struct Lane {
    kind: WriteKind,
    pending: BTreeMap<String, Vec<UserTask>>,
    deadline: Option<Instant>,
}

impl Lane {
    fn new(kind: WriteKind) -> Self {
        Self {
            kind,
            pending: BTreeMap::new(),
            deadline: None,
        }
    }

    fn submit(&mut self, author_id: String, tasks: Vec<UserTask>, window: Duration) {
        if tasks.is_empty() {
            // Nothing left to write for this author
            self.pending.remove(&author_id);
            if self.pending.is_empty() {
                self.deadline = None;
            }
        } else {
            self.pending.insert(author_id, tasks);
            self.deadline = Some(Instant::now() + window);
        }
    }

    fn take(&mut self) -> Vec<UserTask> {
        self.deadline = None;
        std::mem::take(&mut self.pending).into_values().flatten().collect()
    }
}

/// Handle to the background writer task.
///
/// Dropping the last handle flushes whatever is pending and stops the task.
pub struct CoalescingWriter {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<WriterStatus>,
}

impl CoalescingWriter {
    /// Spawn the writer on the current tokio runtime
    pub fn spawn(repo: Arc<dyn Repository<UserTask>>, window: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(WriterStatus::default());
        tokio::spawn(run(repo, rx, window, status_tx));
        Self { commands, status }
    }

    /// Replace `author_id`'s pending creates; an empty set clears them
    pub fn submit_create(&self, author_id: &str, tasks: Vec<UserTask>) {
        self.submit(WriteKind::Create, author_id, tasks);
    }

    /// Replace `author_id`'s pending updates; an empty set clears them
    pub fn submit_update(&self, author_id: &str, tasks: Vec<UserTask>) {
        self.submit(WriteKind::Update, author_id, tasks);
    }

    fn submit(&self, kind: WriteKind, author_id: &str, tasks: Vec<UserTask>) {
        let count = tasks.len();
        if self.commands.send(Command::Submit(kind, author_id.to_string(), tasks)).is_err() {
            log::warn!("task writer stopped, dropped {} pending {:?} tasks", count, kind);
        }
    }

    /// Write both lanes now instead of waiting for the window
    pub async fn flush(&self) -> DomainResult<FlushReport> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| DomainError::Internal("task writer stopped".to_string()))?;
        rx.await
            .map_err(|_| DomainError::Internal("task writer stopped".to_string()))?
    }

    pub fn status(&self) -> watch::Receiver<WriterStatus> {
        self.status.clone()
    }
}

async fn run(
    repo: Arc<dyn Repository<UserTask>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    window: Duration,
    status: watch::Sender<WriterStatus>,
) {
    let mut creates = Lane::new(WriteKind::Create);
    let mut updates = Lane::new(WriteKind::Update);

    loop {
        let create_due = creates.deadline;
        let update_due = updates.deadline;

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Submit(WriteKind::Create, author, tasks)) => creates.submit(author, tasks, window),
                Some(Command::Submit(WriteKind::Update, author, tasks)) => updates.submit(author, tasks, window),
                Some(Command::Flush(reply)) => {
                    let result = flush_lanes(repo.as_ref(), &mut creates, &mut updates, &status).await;
                    let _ = reply.send(result);
                }
                None => {
                    let _ = flush_lanes(repo.as_ref(), &mut creates, &mut updates, &status).await;
                    break;
                }
            },
            () = sleep_until(create_due.unwrap_or_else(Instant::now)), if create_due.is_some() => {
                let _ = write_lane(repo.as_ref(), &mut creates, &status).await;
            }
            () = sleep_until(update_due.unwrap_or_else(Instant::now)), if update_due.is_some() => {
                let _ = write_lane(repo.as_ref(), &mut updates, &status).await;
            }
        }
    }
    log::debug!("task writer stopped");
}

async fn flush_lanes(
    repo: &dyn Repository<UserTask>,
    creates: &mut Lane,
    updates: &mut Lane,
    status: &watch::Sender<WriterStatus>,
) -> DomainResult<FlushReport> {
    let created = write_lane(repo, creates, status).await;
    let updated = write_lane(repo, updates, status).await;
    Ok(FlushReport {
        created: created?,
        updated: updated?,
    })
}

/// Drop catalog copies whose (author, label, frequency) is already stored.
///
/// A reconciliation pass may have read storage before an earlier pass's
/// creates were committed. This writer is the only producer of catalog
/// copies, so checking here keeps at most one per catalog entry.
async fn drop_already_stored(repo: &dyn Repository<UserTask>, tasks: Vec<UserTask>) -> DomainResult<Vec<UserTask>> {
    let authors: BTreeSet<String> = tasks.iter().map(|t| t.author_id.clone()).collect();
    let mut taken: HashSet<(String, String, TaskFrequency)> = HashSet::new();
    for author in authors {
        for stored in repo.query(&TaskFilter::Author(author)).await? {
            if !stored.custom {
                taken.insert((stored.author_id, stored.label, stored.frequency));
            }
        }
    }

    let before = tasks.len();
    let fresh: Vec<UserTask> = tasks
        .into_iter()
        .filter(|t| t.custom || taken.insert((t.author_id.clone(), t.label.clone(), t.frequency)))
        .collect();
    if fresh.len() < before {
        log::debug!("skipped {} catalog tasks already stored", before - fresh.len());
    }
    Ok(fresh)
}

async fn write_lane(
    repo: &dyn Repository<UserTask>,
    lane: &mut Lane,
    status: &watch::Sender<WriterStatus>,
) -> DomainResult<usize> {
    let kind = lane.kind;
    let mut tasks = lane.take();
    if kind == WriteKind::Create && !tasks.is_empty() {
        tasks = match drop_already_stored(repo, tasks).await {
            Ok(tasks) => tasks,
            Err(e) => {
                log::error!("{:?} batch failed: {}", kind, e);
                status.send_modify(|s| s.last_error = Some(e.clone()));
                return Err(e);
            }
        };
    }

    let mut batch = WriteBatch::new();
    for task in tasks {
        if task.key.is_empty() {
            log::error!("task \"{}\" reached the writer without a key, skipped", task.label);
            continue;
        }
        batch.set(task);
    }
    if batch.is_empty() {
        return Ok(0);
    }

    match repo.commit(batch).await {
        Ok(count) => {
            log::info!("{} {} tasks", kind.verb(), count);
            status.send_modify(|s| {
                s.commits += 1;
                match kind {
                    WriteKind::Create => s.created += count as u64,
                    WriteKind::Update => s.updated += count as u64,
                }
                s.last_error = None;
            });
            Ok(count)
        }
        Err(e) => {
            log::error!("{:?} batch failed: {}", kind, e);
            status.send_modify(|s| s.last_error = Some(e.clone()));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskFrequency, TaskScope};
    use crate::repository::MemoryRepository;
    use tokio::time::sleep;

    fn task(key: &str) -> UserTask {
        let mut task = UserTask::new_custom("alice", format!("Task {}", key), TaskFrequency::Daily, TaskScope::Character, 1);
        task.key = key.to_string();
        task
    }

    fn keys(tasks: &[UserTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.key.as_str()).collect()
    }

    fn setup() -> (Arc<MemoryRepository<UserTask>>, CoalescingWriter) {
        let repo = Arc::new(MemoryRepository::new());
        let writer = CoalescingWriter::spawn(repo.clone(), Duration::from_millis(1000));
        (repo, writer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_becomes_one_batch() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task("a1")]);
        sleep(Duration::from_millis(500)).await;
        writer.submit_create("alice", vec![task("a2"), task("b2")]);
        sleep(Duration::from_millis(999)).await;
        assert_eq!(repo.commit_count(), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(repo.commit_count(), 1);
        assert_eq!(keys(&repo.snapshot().await), vec!["a2", "b2"]);

        let status = writer.status().borrow().clone();
        assert_eq!(status.created, 2);
        assert_eq!(status.commits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lanes_are_independent() {
        let (repo, writer) = setup();
        repo.set(&task("old")).await.unwrap();

        writer.submit_update("alice", vec![task("old")]);
        sleep(Duration::from_millis(600)).await;
        writer.submit_create("alice", vec![task("new")]);
        sleep(Duration::from_millis(401)).await;

        // Update lane fired, create lane still waiting
        assert_eq!(repo.commit_count(), 1);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(repo.commit_count(), 2);
        assert_eq!(writer.status().borrow().updated, 1);
        assert_eq!(writer.status().borrow().created, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task("a")]);
        writer.submit_update("alice", vec![task("b")]);
        let report = writer.flush().await.unwrap();

        assert_eq!(report, FlushReport { created: 1, updated: 1 });
        assert_eq!(repo.snapshot().await.len(), 2);

        // Nothing left for the timer
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(repo.commit_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_without_key_is_skipped() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task(""), task("good")]);
        let report = writer.flush().await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(keys(&repo.snapshot().await), vec!["good"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submission_clears_lane() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task("stale")]);
        writer.submit_create("alice", Vec::new());
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(repo.commit_count(), 0);
        assert_eq!(writer.flush().await.unwrap(), FlushReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_authors_do_not_replace_each_other() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task("a1")]);
        writer.submit_create("bob", vec![task("b1")]);
        writer.submit_create("alice", vec![task("a2")]);
        writer.submit_create("carol", vec![task("c1")]);
        writer.submit_create("carol", Vec::new());
        sleep(Duration::from_millis(1001)).await;

        assert_eq!(repo.commit_count(), 1);
        assert_eq!(keys(&repo.snapshot().await), vec!["a2", "b1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_not_retried() {
        let (repo, writer) = setup();
        repo.set_fail_writes(true);

        writer.submit_create("alice", vec![task("a")]);
        let err = writer.flush().await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        assert!(writer.status().borrow().last_error.is_some());

        repo.set_fail_writes(false);
        assert_eq!(writer.flush().await.unwrap().created, 0);
        assert!(repo.snapshot().await.is_empty());
    }

    fn catalog_copy(author: &str, label: &str, key: &str) -> UserTask {
        let mut task = task(key);
        task.author_id = author.to_string();
        task.label = label.to_string();
        task.custom = false;
        task
    }

    #[tokio::test(start_paused = true)]
    async fn test_stored_catalog_copy_is_not_created_again() {
        let (repo, writer) = setup();
        repo.set(&catalog_copy("alice", "Chaos Dungeon", "first")).await.unwrap();

        writer.submit_create(
            "alice",
            vec![catalog_copy("alice", "Chaos Dungeon", "second"), catalog_copy("alice", "Guardian", "g1")],
        );
        writer.submit_create("bob", vec![catalog_copy("bob", "Chaos Dungeon", "b1")]);
        let report = writer.flush().await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(keys(&repo.snapshot().await), vec!["first", "g1", "b1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_pending() {
        let (repo, writer) = setup();

        writer.submit_create("alice", vec![task("late")]);
        drop(writer);
        sleep(Duration::from_millis(1)).await;

        assert_eq!(keys(&repo.snapshot().await), vec!["late"]);
    }
}
