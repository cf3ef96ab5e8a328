//! Simple pooling example
//!
//! Demonstrates basic resource pool usage: construct a pool, borrow a
//! resource with the scoped wrapper, and borrow/release manually.

use std::time::Duration;

use stripe_pool::{Manage, Pool};

struct Connections;

impl Manage for Connections {
    type Resource = String;
    type Error = std::convert::Infallible;

    async fn create(&self) -> Result<String, Self::Error> {
        // Simulate connection setup latency.
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(format!("connection-{}", std::process::id()))
    }

    async fn destroy(&self, resource: String) {
        println!("closing {resource}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Simple Resource Pool Example ===\n");

    let pool = Pool::new(Connections, 4, Duration::from_secs(60), 10)?;
    println!("Pool created with:");
    println!("  - Stripes: {}", pool.num_stripes());
    println!("  - Max resources per stripe: {}", pool.max_resources());
    println!("  - Idle time: {:?}\n", pool.idle_time());

    // Scoped borrow: the connection is returned automatically on success.
    println!("Borrowing via with_resource...");
    let reply = pool
        .with_resource(|conn| {
            let conn = conn.clone();
            async move {
                println!("  using {conn}");
                Ok::<_, std::convert::Infallible>(conn.len())
            }
        })
        .await?;
    println!("✓ action returned {reply}\n");

    // Manual borrow/release.
    println!("Borrowing manually...");
    let leased = pool.take().await?;
    println!("✓ acquired {}", *leased);
    pool.put(leased);
    println!("✓ resource released\n");

    println!("=== Example completed! ===");
    Ok(())
}
