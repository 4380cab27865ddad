//! Demonstration of Store for managing complex state

use zusdux::{Store, StoreConfig};

#[derive(Clone, Debug)]
struct TodoItem {
    id: usize,
    title: String,
    completed: bool,
}

#[derive(Clone, Debug)]
struct AppState {
    todos: Vec<TodoItem>,
    filter: TodoFilter,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TodoFilter {
    All,
    Active,
    Completed,
}

impl AppState {
    fn new() -> Self {
        Self {
            todos: Vec::new(),
            filter: TodoFilter::All,
        }
    }

    fn with_todo(&self, title: String) -> Self {
        let mut next = self.clone();
        next.todos.push(TodoItem {
            id: self.todos.len(),
            title,
            completed: false,
        });
        next
    }

    fn with_toggled(&self, id: usize) -> Self {
        let mut next = self.clone();
        if let Some(todo) = next.todos.iter_mut().find(|t| t.id == id) {
            todo.completed = !todo.completed;
        }
        next
    }

    fn filtered_todos(&self) -> Vec<&TodoItem> {
        match self.filter {
            TodoFilter::All => self.todos.iter().collect(),
            TodoFilter::Active => self.todos.iter().filter(|t| !t.completed).collect(),
            TodoFilter::Completed => self.todos.iter().filter(|t| t.completed).collect(),
        }
    }

    fn stats(&self) -> (usize, usize, usize) {
        let total = self.todos.len();
        let completed = self.todos.iter().filter(|t| t.completed).count();
        let active = total - completed;
        (total, active, completed)
    }
}

fn todo_store() -> zusdux::Result<Store<AppState>> {
    StoreConfig::new(AppState::new())
        .name("todos")
        .reducer("addTodo", |s: &AppState, title: String| s.with_todo(title))
        .reducer("toggleTodo", |s: &AppState, id: usize| s.with_toggled(id))
        .reducer("setFilter", |s: &AppState, filter: TodoFilter| AppState {
            filter,
            ..s.clone()
        })
        .build()
}

fn print_todos(store: &Store<AppState>) {
    store.read(|state| {
        for todo in state.filtered_todos() {
            let status = if todo.completed { "✓" } else { " " };
            println!("   [{}] {}", status, todo.title);
        }
    });
}

fn main() -> zusdux::Result<()> {
    println!("=== Store Example: Todo App ===\n");

    let store = todo_store()?;

    println!("1. Setting up subscriber");
    let reader = store.downgrade();
    let _logger = store.subscribe(move || {
        let Some(reader) = reader.upgrade() else { return };
        let (total, active, completed) = reader.read(|state| state.stats());
        println!(
            "   [Store Update] Total: {}, Active: {}, Completed: {}",
            total, active, completed
        );
    });

    println!("\n2. Adding todos");
    store.dispatch("addTodo", "Learn Rust".to_string())?;
    store.dispatch("addTodo", "Build a state container".to_string())?;
    store.dispatch("addTodo", "Write documentation".to_string())?;

    println!("\n3. Current todos:");
    print_todos(&store);

    println!("\n4. Completing first todo");
    store.dispatch("toggleTodo", 0_usize)?;

    println!("\n5. Filtering to show only active todos");
    let filter = store.select(|state: &AppState| state.filter);
    let _filter_log = filter.on_change(|| println!("   [Filter changed]"));
    store.dispatch("setFilter", TodoFilter::Active)?;
    print_todos(&store);

    println!("\n6. Filtering to show completed todos");
    store.dispatch("setFilter", TodoFilter::Completed)?;
    print_todos(&store);

    println!("\n7. Final statistics:");
    let (total, active, completed) = store.read(|state| state.stats());
    println!("   Total: {}", total);
    println!("   Active: {}", active);
    println!("   Completed: {}", completed);

    println!("\n✓ Example complete!");
    Ok(())
}
