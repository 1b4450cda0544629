//! BDD step definitions for persisted status

use cucumber::{given, then};

use whatsup::store::StateStore;

use crate::world::WhatsupWorld;

#[given(expr = "the stored status for {string} is {string}")]
async fn stored_status(world: &mut WhatsupWorld, key: String, value: String) {
    world.store.inner.put(&key, &value).await.unwrap();
}

#[then(expr = "the stored status for {string} is {string}")]
async fn stored_status_is(world: &mut WhatsupWorld, key: String, expected: String) {
    let stored = world.store.get(&key).await.unwrap();
    assert_eq!(stored.as_deref(), Some(expected.as_str()), "key {}", key);
}

#[then(expr = "nothing is stored for {string}")]
async fn nothing_stored(world: &mut WhatsupWorld, key: String) {
    assert_eq!(world.store.get(&key).await.unwrap(), None, "key {}", key);
}

#[then(expr = "{int} status write(s) happened during the run")]
fn status_writes(world: &mut WhatsupWorld, expected: usize) {
    let writes = world.store.put_count() - world.puts_before_run;
    assert_eq!(writes, expected);
}
