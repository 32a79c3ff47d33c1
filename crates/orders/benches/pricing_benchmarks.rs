use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use rust_decimal::Decimal;

use shopworks_core::{OrderId, OrderItemId, ProductId};
use shopworks_orders::{OrderItem, order_total};

fn make_items(count: usize) -> Vec<OrderItem> {
    let order_id = OrderId::new();
    (0..count)
        .map(|i| OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: ProductId::new(),
            quantity: (i % 7 + 1) as u32,
            price: Decimal::new(999 + (i as i64 * 137) % 100_000, 2),
            discount_percentage: if i % 3 == 0 {
                Some(Decimal::new(((i as i64 * 53) % 990) + 10, 1))
            } else {
                None
            },
            created_at: Utc::now(),
        })
        .collect()
}

fn bench_order_total(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_total");
    for &count in &[1usize, 10, 100, 1_000] {
        let items = make_items(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &items, |b, items| {
            b.iter(|| order_total(black_box(items)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_order_total);
criterion_main!(benches);
