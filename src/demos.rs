//! Bounded-buffer producer/consumer choreography, built only from the
//! public [`crate::kernel::Kernel`] API. Not part of the core itself, but
//! a demonstration of the classic `mutex`/`empty`/`full` protocol used to
//! show semaphore correctness. Deterministic (strict produce/consume
//! alternation) rather than randomized, so it doubles as an integration
//! test fixture.

use crate::kernel::Kernel;
use crate::process::Pid;

pub struct ProducerConsumerOutcome {
    pub producer: Pid,
    pub consumer: Pid,
    pub items_produced: usize,
    pub items_consumed: usize,
}

/// Runs `item_count` complete produce-then-consume cycles over a buffer of
/// `buffer_capacity`, using the classic three-semaphore protocol: `empty`
/// counts free slots, `full` counts occupied slots, `mutex` guards the
/// critical section around the buffer itself.
pub fn producer_consumer(
    kernel: &mut Kernel,
    buffer_capacity: usize,
    item_count: usize,
) -> ProducerConsumerOutcome {
    kernel.create_shared_buffer("buffer", buffer_capacity);
    kernel.create_semaphore("mutex", 1);
    kernel.create_semaphore("empty", buffer_capacity as i64);
    kernel.create_semaphore("full", 0);

    let producer = kernel.create(512, 30, 3, Some(25));
    let consumer = kernel.create(512, 30, 3, Some(25));
    kernel.allocate(producer);
    kernel.allocate(consumer);

    let mut items_produced = 0;
    let mut items_consumed = 0;

    for i in 0..item_count {
        kernel.semaphore_wait(producer, "empty");
        kernel.semaphore_wait(producer, "mutex");
        if kernel.buffer_write("buffer", producer, format!("item-{i}")) {
            items_produced += 1;
        }
        kernel.semaphore_signal(producer, "mutex");
        kernel.semaphore_signal(producer, "full");

        kernel.semaphore_wait(consumer, "full");
        kernel.semaphore_wait(consumer, "mutex");
        if kernel.buffer_read("buffer").is_some() {
            items_consumed += 1;
        }
        kernel.semaphore_signal(consumer, "mutex");
        kernel.semaphore_signal(consumer, "empty");
    }

    ProducerConsumerOutcome {
        producer,
        consumer,
        items_produced,
        items_consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn delivers_every_item_and_never_overflows_the_buffer() {
        let config = SimConfig::from_str(
            r#"
            [memory]
            ram_kb = 1024
            swap_kb = 1024
            page_kb = 64
            "#,
        )
        .unwrap();
        let mut kernel = Kernel::new(&config);

        let outcome = producer_consumer(&mut kernel, 2, 3);
        assert_eq!(outcome.items_produced, 3);
        assert_eq!(outcome.items_consumed, 3);
    }
}
