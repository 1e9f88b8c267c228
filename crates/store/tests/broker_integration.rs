use chrono::Utc;
use kabu_core::catalog::entity::NewStock;
use kabu_core::catalog::port::StockStore;
use kabu_core::identity::entity::{NewUser, UserRole};
use kabu_core::identity::port::UserStore;
use kabu_core::ledger::entity::{NewOrder, OrderId, OrderSide};
use kabu_core::ledger::port::OrderStore;
use kabu_core::store::error::StoreError;
use kabu_store::broker::SqliteBrokerStore;
use kabu_store::config::set_root_dir;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
        role: UserRole::Standard,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_broker_store_full_integration() {
    // 1. 初始化临时测试环境
    let tmp_dir = tempdir().expect("Failed to create temp dir");
    set_root_dir(tmp_dir.path().to_path_buf());

    let store = SqliteBrokerStore::new()
        .await
        .expect("Failed to create broker store");

    // 2. 用户存取与唯一性
    let alice = store.insert_user(&new_user("alice", "alice@test.com")).await.unwrap();
    let bob = store.insert_user(&new_user("bob", "bob@test.com")).await.unwrap();
    assert_ne!(alice.id, bob.id);

    let loaded = store.get_user(alice.id).await.unwrap().expect("User should exist");
    assert_eq!(loaded.username, "alice");
    assert_eq!(loaded.email, "alice@test.com");
    assert_eq!(loaded.role, UserRole::Standard);

    let by_name = store.find_user_by_username("bob").await.unwrap().expect("bob exists");
    assert_eq!(by_name.id, bob.id);
    assert!(store.find_user_by_username("carol").await.unwrap().is_none());
    let by_email = store.find_user_by_email("alice@test.com").await.unwrap().expect("alice exists");
    assert_eq!(by_email.id, alice.id);

    // 重复用户名 / 重复邮箱 -> Conflict
    let dup = store.insert_user(&new_user("alice", "other@test.com")).await;
    assert!(matches!(dup, Err(StoreError::Conflict(_))));
    let dup = store.insert_user(&new_user("other", "bob@test.com")).await;
    assert!(matches!(dup, Err(StoreError::Conflict(_))));

    // 3. 股票目录：插入、读取、大小写敏感的子串搜索
    let apple = store
        .insert_stock(&NewStock { name: "Apple".to_string(), price: dec!(170.25) })
        .await
        .unwrap();
    let pine = store
        .insert_stock(&NewStock { name: "Pineapple Corp".to_string(), price: dec!(3.00) })
        .await
        .unwrap();
    store
        .insert_stock(&NewStock { name: "Banana".to_string(), price: dec!(1.10) })
        .await
        .unwrap();

    let fetched = store.get_stock(apple.id).await.unwrap().expect("Stock should exist");
    assert_eq!(fetched.name, "Apple");
    assert_eq!(fetched.price, dec!(170.25));

    let all = store.list_stocks(None).await.unwrap();
    assert_eq!(all.len(), 3);
    // 按主键升序
    assert_eq!(all[0].name, "Apple");
    assert_eq!(all[2].name, "Banana");

    // "apple" 只命中 "Pineapple Corp"，不命中 "Apple"（大小写敏感）
    let hits = store.list_stocks(Some("apple")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, pine.id);

    let hits = store.list_stocks(Some("App")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, apple.id);

    let hits = store.list_stocks(Some("XYZ")).await.unwrap();
    assert!(hits.is_empty());

    // 4. 订单台账：归属过滤
    let a1 = store
        .insert_order(&NewOrder { owner: alice.id, stock: apple.id, side: OrderSide::Buy, quantity: 10 })
        .await
        .unwrap();
    store
        .insert_order(&NewOrder { owner: alice.id, stock: pine.id, side: OrderSide::Sell, quantity: 5 })
        .await
        .unwrap();
    let b1 = store
        .insert_order(&NewOrder { owner: bob.id, stock: apple.id, side: OrderSide::Buy, quantity: 7 })
        .await
        .unwrap();

    let alice_orders = store.list_orders_for_owner(alice.id).await.unwrap();
    assert_eq!(alice_orders.len(), 2);
    assert!(alice_orders.iter().all(|o| o.owner == alice.id));

    // 主键查找同样只在自己的订单中命中
    let found = store.get_order_for_owner(alice.id, a1.id).await.unwrap();
    assert!(found.is_some());
    let hidden = store.get_order_for_owner(alice.id, b1.id).await.unwrap();
    assert!(hidden.is_none(), "他人的订单必须不可见");
    let missing = store.get_order_for_owner(alice.id, OrderId(9999)).await.unwrap();
    assert!(missing.is_none());

    // (owner, stock) 维度的读取供投资额计算使用
    let alice_apple = store.list_orders_for_stock(alice.id, apple.id).await.unwrap();
    assert_eq!(alice_apple.len(), 1);
    assert_eq!(alice_apple[0].quantity, 10);
    assert_eq!(alice_apple[0].side, OrderSide::Buy);

    let bob_pine = store.list_orders_for_stock(bob.id, pine.id).await.unwrap();
    assert!(bob_pine.is_empty());
}
