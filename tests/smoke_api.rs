use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::{env, time::Duration};
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    message: String,
    token: String,
    role: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    email: String,
    role: String,
}

#[derive(Deserialize)]
struct CreateLandResponse {
    status: String,
    land_id: i64,
}

#[derive(Deserialize)]
struct ContactResponse {
    seller_name: String,
    agency: String,
    phone: String,
    line_id: String,
}

#[derive(Deserialize)]
struct DocumentResponse {
    doc_type: String,
    file: String,
    is_locked: bool,
}

#[derive(Deserialize)]
struct LandDetailResponse {
    view_count: i64,
    images: Vec<String>,
    contact: ContactResponse,
    documents: Vec<DocumentResponse>,
    unlocked_list: Vec<String>,
}

const MASK: &str = "-----";
const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn image_part(file_name: &str) -> Part {
    Part::bytes(IMAGE_BYTES.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("image part")
}

fn unique_email(tag: &str) -> String {
    format!("smoke-{}+{}@example.com", tag, Uuid::new_v4().simple())
}

fn unique_citizen_id() -> String {
    format!("{:013}", Uuid::new_v4().as_u128() % 10_000_000_000_000)
}

fn unique_phone() -> String {
    format!("0{:09}", Uuid::new_v4().as_u128() % 1_000_000_000)
}

fn signup_form(email: &str, citizen_id: &str, phone: &str, intent: &str) -> Form {
    Form::new()
        .text("type", intent.to_string())
        .text("name", "Somsak")
        .text("lastname", "Thongdee")
        .text("phone", phone.to_string())
        .text("email", email.to_string())
        .text("password", "Secret1pw")
        .text("address", "Bangkok")
        .text("id_number", citizen_id.to_string())
        .text("line_id", "somsak_line")
        .part("id_front", image_part("front.png"))
        .part("id_back", image_part("back.png"))
        .part("selfie", image_part("selfie.png"))
}

#[tokio::test]
async fn smoke_api_flow() {
    dotenvy::dotenv().ok();

    // Needs the full local stack (API + Postgres). Opt in explicitly so a
    // plain `cargo test` stays fast.
    let run_smoke = env::var("RUN_SMOKE_API")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !run_smoke {
        eprintln!("skipping smoke_api_flow (set RUN_SMOKE_API=1 to enable)");
        return;
    }

    let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let retries: usize = env::var("SMOKE_API_RETRIES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(30);
    let retry_delay_ms: u64 = env::var("SMOKE_API_RETRY_DELAY_MS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(300);

    let client = reqwest::Client::new();
    wait_for_health(&client, &base_url, retries, retry_delay_ms).await;

    // Landlord signs up and logs in.
    let landlord_email = unique_email("landlord");
    let landlord_cid = unique_citizen_id();
    let landlord_phone = unique_phone();

    let signup = client
        .post(format!("{}/api/auth/signup", base_url))
        .multipart(signup_form(
            &landlord_email,
            &landlord_cid,
            &landlord_phone,
            "seller",
        ))
        .send()
        .await
        .expect("signup request failed");
    assert_eq!(signup.status(), StatusCode::CREATED);
    let signup_body: MessageResponse = signup.json().await.expect("signup json");
    assert_eq!(signup_body.message, "Signup successful");

    // Reusing the email must fail even with a fresh citizen id.
    let duplicate = client
        .post(format!("{}/api/auth/signup", base_url))
        .multipart(signup_form(
            &landlord_email,
            &unique_citizen_id(),
            &unique_phone(),
            "seller",
        ))
        .send()
        .await
        .expect("duplicate signup request failed");
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    let duplicate_body: ErrorResponse = duplicate.json().await.expect("duplicate json");
    assert_eq!(duplicate_body.error, "Email is already registered");

    let bad_login = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({
            "email": landlord_email,
            "password": "WrongSecret1",
        }))
        .send()
        .await
        .expect("bad login request failed");
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);
    let bad_login_body: ErrorResponse = bad_login.json().await.expect("bad login json");
    assert_eq!(bad_login_body.error, "Invalid credentials");

    let login = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({
            "email": landlord_email,
            "password": "Secret1pw",
        }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(login.status(), StatusCode::OK);
    let login_body: LoginResponse = login.json().await.expect("login json");
    assert_eq!(login_body.message, "Login success");
    assert_eq!(login_body.role, "landlord");
    assert_eq!(login_body.kind, "user");
    assert!(!login_body.token.is_empty());
    let landlord_token = login_body.token;

    let profile = client
        .get(format!("{}/api/auth/profile", base_url))
        .bearer_auth(&landlord_token)
        .send()
        .await
        .expect("profile request failed");
    assert_eq!(profile.status(), StatusCode::OK);
    let profile_body: ProfileResponse = profile.json().await.expect("profile json");
    assert_eq!(profile_body.email, landlord_email);
    assert_eq!(profile_body.role, "landlord");

    // 1 rai at 1000 per square wa: 400 sq wa, 400000 total.
    let listing_form = Form::new()
        .text("rai", "1")
        .text("ngan", "0")
        .text("wa", "0")
        .text("frontage_width", "20")
        .text("price_per_sqwa", "1000")
        .text("price_total", "400000")
        .text("seller_name", "Somsak Thongdee")
        .text("phone", landlord_phone.clone())
        .text("line_id", "somsak_line")
        .text("doc_detail", "CN-4521")
        .part("images", image_part("plot-1.png"))
        .part("images", image_part("plot-2.png"));
    let create_land = client
        .post(format!("{}/api/lands", base_url))
        .bearer_auth(&landlord_token)
        .multipart(listing_form)
        .send()
        .await
        .expect("create land request failed");
    assert_eq!(create_land.status(), StatusCode::CREATED);
    let create_land_body: CreateLandResponse = create_land.json().await.expect("create land json");
    assert_eq!(create_land_body.status, "success");
    let land_id = create_land_body.land_id;

    // Anonymous view: everything paid is masked, and this view counts.
    let anonymous = client
        .get(format!("{}/api/lands/{}", base_url, land_id))
        .send()
        .await
        .expect("anonymous detail request failed");
    assert_eq!(anonymous.status(), StatusCode::OK);
    let anonymous_body: LandDetailResponse = anonymous.json().await.expect("anonymous json");
    assert_eq!(anonymous_body.view_count, 1);
    assert_eq!(anonymous_body.images.len(), 2);
    assert_eq!(anonymous_body.contact.seller_name, MASK);
    assert_eq!(anonymous_body.contact.agency, MASK);
    assert_eq!(anonymous_body.contact.phone, MASK);
    assert_eq!(anonymous_body.contact.line_id, MASK);
    assert!(anonymous_body.unlocked_list.is_empty());
    assert_eq!(anonymous_body.documents.len(), 1);
    assert_eq!(anonymous_body.documents[0].doc_type, "deed");
    assert!(anonymous_body.documents[0].is_locked);
    assert_eq!(anonymous_body.documents[0].file, MASK);

    // A buyer pays for owner and contact but not the documents.
    let buyer_email = unique_email("buyer");
    let buyer_signup = client
        .post(format!("{}/api/auth/signup", base_url))
        .multipart(signup_form(
            &buyer_email,
            &unique_citizen_id(),
            &unique_phone(),
            "buyer",
        ))
        .send()
        .await
        .expect("buyer signup request failed");
    assert_eq!(buyer_signup.status(), StatusCode::CREATED);

    let buyer_login = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({
            "email": buyer_email,
            "password": "Secret1pw",
        }))
        .send()
        .await
        .expect("buyer login request failed");
    assert_eq!(buyer_login.status(), StatusCode::OK);
    let buyer_login_body: LoginResponse = buyer_login.json().await.expect("buyer login json");
    assert_eq!(buyer_login_body.role, "buyer");
    let buyer_token = buyer_login_body.token;

    let unlock = client
        .post(format!("{}/api/lands/unlock", base_url))
        .bearer_auth(&buyer_token)
        .json(&serde_json::json!({
            "land_id": land_id,
            "items": ["owner", "contact"],
        }))
        .send()
        .await
        .expect("unlock request failed");
    assert_eq!(unlock.status(), StatusCode::CREATED);

    let unlocked = client
        .get(format!("{}/api/lands/{}", base_url, land_id))
        .bearer_auth(&buyer_token)
        .send()
        .await
        .expect("unlocked detail request failed");
    assert_eq!(unlocked.status(), StatusCode::OK);
    let unlocked_body: LandDetailResponse = unlocked.json().await.expect("unlocked json");
    assert_eq!(unlocked_body.view_count, 2);
    assert_eq!(unlocked_body.contact.seller_name, "Somsak Thongdee");
    // No agency on the listing, so the owner unlock reveals the fallback.
    assert_eq!(unlocked_body.contact.agency, "Private");
    assert_eq!(unlocked_body.contact.phone, landlord_phone);
    assert_eq!(unlocked_body.contact.line_id, "somsak_line");
    assert!(unlocked_body.documents[0].is_locked);
    assert_eq!(unlocked_body.documents[0].file, MASK);
    assert!(unlocked_body
        .unlocked_list
        .iter()
        .any(|item| item == "owner"));
    assert!(unlocked_body
        .unlocked_list
        .iter()
        .any(|item| item == "contact"));

    // Granting again is a no-op, not an error.
    let repeat_unlock = client
        .post(format!("{}/api/lands/unlock", base_url))
        .bearer_auth(&buyer_token)
        .json(&serde_json::json!({
            "land_id": land_id,
            "items": ["owner", "contact"],
        }))
        .send()
        .await
        .expect("repeat unlock request failed");
    assert_eq!(repeat_unlock.status(), StatusCode::CREATED);

    let empty_unlock = client
        .post(format!("{}/api/lands/unlock", base_url))
        .bearer_auth(&buyer_token)
        .json(&serde_json::json!({ "land_id": land_id, "items": [] }))
        .send()
        .await
        .expect("empty unlock request failed");
    assert_eq!(empty_unlock.status(), StatusCode::BAD_REQUEST);
    let empty_unlock_body: ErrorResponse = empty_unlock.json().await.expect("empty unlock json");
    assert_eq!(empty_unlock_body.error, "Please select items to unlock.");

    // The buyer role may not post listings.
    let forbidden = client
        .post(format!("{}/api/lands", base_url))
        .bearer_auth(&buyer_token)
        .multipart(Form::new().text("rai", "1"))
        .send()
        .await
        .expect("forbidden create request failed");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

async fn wait_for_health(client: &reqwest::Client, base_url: &str, retries: usize, delay_ms: u64) {
    let url = format!("{}/api/health", base_url);
    for attempt in 0..retries {
        match client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => return,
            _ => {
                if attempt + 1 >= retries {
                    panic!(
                        "service not ready after {} attempts (base_url={})",
                        retries, base_url
                    );
                }
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
