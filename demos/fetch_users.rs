//! Asynchronous setter action: loading flag first, data after a delay

use std::time::Duration;
use zusdux::{AsyncAction, SetState, StoreConfig};

#[derive(Clone, Debug, Default)]
struct UsersState {
    users: Vec<String>,
    is_loading: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> zusdux::Result<()> {
    let store = StoreConfig::new(UsersState::default())
        .name("users")
        .async_setter("fetchUsers", |set: SetState<UsersState>, _: ()| {
            set.patch(|s: &mut UsersState| s.is_loading = true);
            async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                set.patch(|s: &mut UsersState| {
                    s.users = vec!["User 1".to_string(), "User 2".to_string()];
                    s.is_loading = false;
                });
            }
        })
        .build()?;

    let reader = store.downgrade();
    let _log = store.subscribe(move || {
        let Some(reader) = reader.upgrade() else { return };
        let state = reader.get_state();
        println!(
            "   [Update] loading: {}, users: {:?}",
            state.is_loading, state.users
        );
    });

    let fetch_users: AsyncAction<()> = store.action("fetchUsers")?;
    println!("Calling fetchUsers");
    let pending = fetch_users.call(())?;
    println!("Returned while loading: {}", store.get_state().is_loading);

    pending.await;
    println!("Done: {} users", store.get_state().users.len());
    Ok(())
}
