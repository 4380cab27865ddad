//! Counter application: reducers, subscriptions and selector bindings together

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zusdux::{Action, StoreConfig};

#[derive(Clone, Debug)]
struct CounterState {
    name: String,
    count: i32,
    step: i32,
    history: Vec<i32>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            name: "counter".to_string(),
            count: 0,
            step: 1,
            history: vec![0],
        }
    }

    fn moved_by(&self, delta: i32) -> Self {
        let mut next = self.clone();
        next.count += delta;
        next.history.push(next.count);
        next
    }
}

fn main() -> zusdux::Result<()> {
    println!("=== Complete Counter Application ===\n");

    println!("1. Initializing counter store");
    let store = StoreConfig::new(CounterState::new())
        .name("counter")
        .reducer("increment", |s: &CounterState, _: ()| s.moved_by(s.step))
        .reducer("decrement", |s: &CounterState, _: ()| s.moved_by(-s.step))
        .reducer("setStep", |s: &CounterState, step: i32| CounterState {
            step,
            ..s.clone()
        })
        .reducer("setName", |s: &CounterState, name: String| CounterState {
            name,
            ..s.clone()
        })
        .reducer("reset", |s: &CounterState, _: ()| s.moved_by(-s.count))
        .build()?;

    let increment: Action<()> = store.action("increment")?;
    let decrement: Action<()> = store.action("decrement")?;

    println!("\n2. Binding a view to the count only");
    let renders = Arc::new(AtomicUsize::new(1));
    let count = store.select(|s: &CounterState| s.count);
    let view = {
        let renders = renders.clone();
        let store = store.downgrade();
        count.on_change(move || {
            let Some(store) = store.upgrade() else { return };
            let n = renders.fetch_add(1, Ordering::SeqCst) + 1;
            let (count, step) = store.read(|s| (s.count, s.step));
            println!("   [Render #{}] Count: {} | Step: {}", n, count, step);
        })
    };

    println!("\n3. Incrementing...");
    increment.call(())?;
    increment.call(())?;
    increment.call(())?;

    println!("\n4. Renaming does not re-render");
    store.dispatch("setName", "renamed".to_string())?;
    println!("   Renders so far: {}", renders.load(Ordering::SeqCst));

    println!("\n5. Changing step size to 5");
    store.dispatch("setStep", 5)?;

    println!("\n6. Incrementing and decrementing with new step...");
    increment.call(())?;
    decrement.call(())?;
    decrement.call(())?;

    println!("\n7. History:");
    store.read(|state| println!("   {:?}", state.history));

    println!("\n8. Resetting...");
    store.dispatch("reset", ())?;

    view.unsubscribe();
    println!("\n9. Final count: {} after {} renders", count.get(), renders.load(Ordering::SeqCst));

    println!("\n✓ Counter application complete!");
    Ok(())
}
