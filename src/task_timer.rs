pub struct TaskTimer {
    started: std::time::Instant,
    name: String,
}

impl TaskTimer {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        println!("Task: {name} started");
        Self {
            started: std::time::Instant::now(),
            name,
        }
    }

    pub fn stop(self) {
        println!(
            "Task: {} finished in {:.1}ms",
            self.name,
            self.started.elapsed().as_secs_f64() * 1000.0
        );
    }
}
