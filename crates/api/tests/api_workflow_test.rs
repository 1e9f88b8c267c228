use std::sync::Arc;

use kabu_api::server::{build_router, AppState};
use kabu_core::identity::entity::{NewUser, UserRole};
use kabu_core::identity::port::UserStore;
use kabu_store::broker::SqliteBrokerStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server() -> (String, Arc<SqliteBrokerStore>, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    kabu_store::config::set_root_dir(tmp_dir.path().to_path_buf());

    let broker = Arc::new(SqliteBrokerStore::new().await.unwrap());

    // 预置一个已知密码的 admin（生产环境由应用启动引导完成同样的事）
    let hashed = bcrypt::hash("test_admin_pwd", bcrypt::DEFAULT_COST).unwrap();
    broker
        .insert_user(&NewUser {
            username: "admin".to_string(),
            email: "admin@test.com".to_string(),
            password_hash: hashed,
            role: UserRole::Admin,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let state = AppState {
        user_store: broker.clone(),
        stock_store: broker.clone(),
        order_store: broker.clone(),
        app_config: Arc::new(kabu_core::config::AppConfig::default()),
    };

    let router = build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let addr = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // 稍微等待服务器启动
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (addr, broker, tmp_dir)
}

async fn login(client: &reqwest::Client, base_url: &str, username: &str, password: &str) -> String {
    let res = client
        .post(format!("{}/login/", base_url))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], username);
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    token
}

#[tokio::test]
async fn test_full_api_workflow() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let (base_url, broker, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    // ============================================
    // Case 1: 注册成功
    // ============================================
    let res = client
        .post(format!("{}/users/", base_url))
        .json(&json!({
            "username": "xavier",
            "email": "xavier@xavier.com",
            "password": "xavierpass"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "xavier");
    assert_eq!(body["email"], "xavier@xavier.com");
    let xavier_id = body["id"].as_i64().unwrap();

    // 注册后立即可按邮箱查询到
    let stored = broker.find_user_by_email("xavier@xavier.com").await.unwrap();
    assert!(stored.is_some());

    // ============================================
    // Case 2: 重复用户名 / 重复邮箱 -> 400
    // ============================================
    let res = client
        .post(format!("{}/users/", base_url))
        .json(&json!({
            "username": "xavier",
            "email": "fresh@example.com",
            "password": "validpass"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"][0], "This field must be unique.");

    // 其余字段即使非法，邮箱占用也必须报告
    let res = client
        .post(format!("{}/users/", base_url))
        .json(&json!({
            "username": "someone_else",
            "email": "xavier@xavier.com",
            "password": "x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"][0], "This field must be unique.");
    assert_eq!(body["password"][0], "Ensure this field has at least 6 characters.");

    // ============================================
    // Case 3: 密码过短 -> 400
    // ============================================
    let res = client
        .post(format!("{}/users/", base_url))
        .json(&json!({
            "username": "shorty",
            "email": "shorty@example.com",
            "password": "12345"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["password"][0], "Ensure this field has at least 6 characters.");

    // ============================================
    // Case 4: 登录失败（密码错误）-> 400
    // ============================================
    let res = client
        .post(format!("{}/login/", base_url))
        .json(&json!({ "username": "xavier", "password": "wrongpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"][0], "Could not login with the supplied credentials");

    // ============================================
    // Case 5: 登录成功 -> 202 + 非空 Token
    // ============================================
    let xavier_token = login(&client, &base_url, "xavier", "xavierpass").await;

    // ============================================
    // Case 6: 未认证注销 -> 401；认证后注销 -> 200
    // ============================================
    let res = client.get(format!("{}/logout/", base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/logout/", base_url))
        .bearer_auth(&xavier_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Logout successful");

    // ============================================
    // Case 7: 权限隔离 - 普通用户创建股票 -> 403
    // ============================================
    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "name": "Apple", "price": "170.25" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN, "非管理员不能维护目录");

    // 未认证创建股票 -> 401（与 403 必须区分）
    let res = client
        .post(format!("{}/stocks/", base_url))
        .json(&json!({ "name": "Apple", "price": "170.25" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // ============================================
    // Case 8: Admin 创建股票 -> 201，随后可公开读取
    // ============================================
    let admin_token = login(&client, &base_url, "admin", "test_admin_pwd").await;

    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Apple", "price": "170.25" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Apple");
    assert_eq!(body["price"], "170.25");
    let apple_id = body["id"].as_i64().unwrap();

    // 目录读取无需认证
    let res = client
        .get(format!("{}/stocks/{}/", base_url, apple_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Apple");
    assert_eq!(body["price"], "170.25");

    let res = client.get(format!("{}/stocks/99999/", base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Not found.");

    // ============================================
    // Case 9: 股票载荷校验 -> 400
    // ============================================
    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "", "price": "1.234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"][0], "This field may not be blank.");
    assert_eq!(body["price"][0], "Ensure that there are no more than 2 decimal places.");

    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Negative Corp", "price": "-3.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["price"][0], "Ensure this value is greater than or equal to 0.");

    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Too Pricey", "price": "1234567.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["price"][0],
        "Ensure that there are no more than 6 digits before the decimal point."
    );

    // ============================================
    // Case 10: 目录搜索（大小写敏感子串）
    // ============================================
    for (name, price) in [("Pineapple Corp", "3.00"), ("Banana", "1.10")] {
        let res = client
            .post(format!("{}/stocks/", base_url))
            .bearer_auth(&admin_token)
            .json(&json!({ "name": name, "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client.get(format!("{}/stocks/", base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);

    let res = client
        .get(format!("{}/stocks/?search=App", base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Apple");

    // 小写 "apple" 只命中 "Pineapple Corp"
    let res = client
        .get(format!("{}/stocks/?search=apple", base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Pineapple Corp");

    // ============================================
    // Case 11: 订单创建：校验先于归属检查
    // ============================================
    // 非法方向编码 -> 400
    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": apple_id, "type": 3, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"][0], "\"3\" is not a valid choice.");

    // 负数量 -> 400
    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": apple_id, "type": 1, "quantity": -5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quantity"][0], "Ensure this value is greater than or equal to 0.");

    // 不存在的股票 -> 400（关联字段非法属于校验失败，不是 404）
    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": 99999, "type": 1, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"][0], "Invalid pk \"99999\" - object does not exist.");

    // 给他人建单 -> 403（字段全部合法时才评估归属）
    let admin_user = broker.find_user_by_username("admin").await.unwrap().unwrap();
    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": admin_user.id.0, "stock": apple_id, "type": 1, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Unable to create orders for other users");

    // 合法创建 -> 201；quantity 缺省为 0
    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": apple_id, "type": 1, "quantity": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["owner"].as_i64().unwrap(), xavier_id);
    assert_eq!(body["stock"].as_i64().unwrap(), apple_id);
    assert_eq!(body["type"], 1);
    assert_eq!(body["quantity"], 100);
    let order_id = body["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": apple_id, "type": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quantity"], 0);

    // ============================================
    // Case 12: 订单读取（隐式归属过滤）
    // ============================================
    let res = client.get(format!("{}/orders/", base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/orders/", base_url))
        .bearer_auth(&xavier_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["owner"].as_i64().unwrap() == xavier_id));

    let res = client
        .get(format!("{}/orders/{}/", base_url, order_id))
        .bearer_auth(&xavier_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/orders/99999/", base_url))
        .bearer_auth(&xavier_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // ============================================
    // Case 13: 投资总额（9 × 100 × 1.00 = 900.00）
    // ============================================
    let res = client
        .post(format!("{}/stocks/", base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "Unit", "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let unit_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    for _ in 0..9 {
        let res = client
            .post(format!("{}/orders/", base_url))
            .bearer_auth(&xavier_token)
            .json(&json!({ "owner": xavier_id, "stock": unit_id, "type": 1, "quantity": 100 }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .post(format!("{}/total-invested/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": unit_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["owner"].as_i64().unwrap(), xavier_id);
    assert_eq!(body["stock"].as_i64().unwrap(), unit_id);
    assert_eq!(body["total_invested"], "900.00");

    // 没有订单的股票 -> 0.00
    let res = client
        .post(format!("{}/total-invested/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": apple_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    // apple 上有 quantity 100 与 0 两笔 -> 100 × 170.25
    assert_eq!(body["total_invested"], "17025.00");

    // 未认证 -> 401；非法主键 -> 400
    let res = client
        .post(format!("{}/total-invested/", base_url))
        .json(&json!({ "owner": xavier_id, "stock": unit_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/total-invested/", base_url))
        .bearer_auth(&xavier_token)
        .json(&json!({ "owner": xavier_id, "stock": 99999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"][0], "Invalid pk \"99999\" - object does not exist.");

    // ============================================
    // Case 14: 畸形 JSON 载荷 -> 400（不是 422）
    // ============================================
    let res = client
        .post(format!("{}/users/", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("JSON parse error:"));
}
