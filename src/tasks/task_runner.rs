use tokio::task::JoinHandle;
use tracing::info;

type TaskStarter = Box<dyn FnOnce() -> JoinHandle<()> + Send>;

/// Collects named background tasks and spawns them together at startup.
pub struct TaskRunner {
    tasks: Vec<(&'static str, TaskStarter)>,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce() -> JoinHandle<()> + Send + 'static,
    {
        self.tasks.push((name, Box::new(task)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn start_all(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|(name, start)| {
                info!(task = name, "starting background task");
                start()
            })
            .collect()
    }
}
