use std::sync::Arc;

use foodbot::{
    AppState, Config, Storage, build_app, build_state,
    config::CheckoutMode,
    models::{Category, ConversationStep, FoodItem, InboundMessage, Selection, Session},
    repository::{InMemoryCatalog, InMemoryStore, SessionRepository},
    services::messaging::{OutboundMessage, RecordingMessenger},
    services::payments::MockGateway,
};
use reqwest::{Client, redirect::Policy};
use secrecy::SecretString;
use tokio::net::TcpListener;
use uuid::Uuid;

use super::sessions::FlakySessions;

pub const GATEWAY_SECRET: &str = "sk_test_webhook_secret";
pub const VERIFY_TOKEN: &str = "verify-me";

/// Catalog entries every test app starts with.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub rice: Category,
    pub grills: Category,
    pub jollof: FoodItem,
    pub fried_rice: FoodItem,
    pub suya: FoodItem,
}

/// Knobs for [`TestApp::with_options`].
#[derive(Debug, Clone)]
pub struct TestAppOptions {
    pub checkout_mode: CheckoutMode,
    /// When set, inbound WhatsApp deliveries must carry `X-Hub-Signature-256`.
    pub whatsapp_app_secret: Option<String>,
    pub max_line_quantity: Option<u32>,
    pub delivery_fee: i64,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            checkout_mode: CheckoutMode::Gateway,
            whatsapp_app_secret: None,
            max_line_quantity: None,
            delivery_fee: 0,
        }
    }
}

/// HTTP test application wrapper
///
/// In-memory storage, the scripted mock gateway and a recording messenger,
/// served by the real router on a random port. Each test gets its own
/// instance so tests can run in parallel.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    pub client: Client,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    /// The session repository the services see; can be told to fail saves.
    pub sessions: Arc<FlakySessions>,
    pub catalog: Arc<InMemoryCatalog>,
    pub gateway: Arc<MockGateway>,
    pub messenger: Arc<RecordingMessenger>,
    pub fixtures: Fixtures,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestAppOptions::default()).await
    }

    pub async fn with_options(options: TestAppOptions) -> Self {
        let mut config = Config::default();
        config.whatsapp.verify_token = SecretString::from(VERIFY_TOKEN.to_string());
        if let Some(secret) = &options.whatsapp_app_secret {
            config.whatsapp.app_secret = SecretString::from(secret.clone());
        }
        config.conversation.checkout_mode = options.checkout_mode;
        config.conversation.max_line_quantity = options.max_line_quantity;
        config.conversation.delivery_fee = options.delivery_fee;

        let catalog = Arc::new(InMemoryCatalog::new());
        let fixtures = seed(&catalog).await;
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(MockGateway::new(GATEWAY_SECRET));
        let messenger = Arc::new(RecordingMessenger::new());

        let sessions = Arc::new(FlakySessions::new(store.clone()));
        let storage = Storage {
            sessions: sessions.clone(),
            ..Storage::in_memory(store.clone(), catalog.clone())
        };
        let state = build_state(config, &storage, gateway.clone(), messenger.clone());
        let app = build_app(state.clone());

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            state,
            store,
            sessions,
            catalog,
            gateway,
            messenger,
            fixtures,
        }
    }

    /// Get the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Runs one message through the conversation service directly.
    pub async fn send(&self, message: InboundMessage) -> Session {
        self.state
            .conversation
            .handle_inbound(message)
            .await
            .expect("inbound message should be handled")
    }

    pub async fn send_text(&self, customer: &str, text: &str) -> Session {
        self.send(InboundMessage::text(customer, text)).await
    }

    pub async fn press(&self, customer: &str, button: &str) -> Session {
        self.send(InboundMessage::selection(
            customer,
            Selection::from_button_title(button),
        ))
        .await
    }

    pub async fn pick_food(&self, customer: &str, food_id: Uuid) -> Session {
        self.send(InboundMessage::selection(customer, Selection::Food(food_id)))
            .await
    }

    /// A customer who has already had the first-contact welcome.
    pub async fn returning_customer(&self, customer: &str) -> Session {
        let session = self.send_text(customer, "hello").await;
        assert!(!session.is_first_contact);
        self.messenger.clear().await;
        session
    }

    /// Drives a returning customer to `checkout` with `quantity` of `food`.
    pub async fn customer_at_checkout(&self, customer: &str, food: Uuid, quantity: u32) -> Session {
        self.returning_customer(customer).await;
        self.pick_food(customer, food).await;
        let session = self.send_text(customer, &quantity.to_string()).await;
        assert_eq!(session.step, ConversationStep::CartManagement);
        let session = self.send_text(customer, "checkout").await;
        assert_eq!(session.step, ConversationStep::Checkout);
        session
    }

    /// Drives a returning customer to `awaiting_payment` and returns the reference.
    pub async fn customer_awaiting_payment(&self, customer: &str) -> String {
        let jollof = self.fixtures.jollof.id;
        self.customer_at_checkout(customer, jollof, 2).await;
        let session = self
            .send_text(customer, "12 Allen Avenue, Ikeja, Lagos")
            .await;
        assert_eq!(session.step, ConversationStep::AwaitingPayment);
        session
            .pending_payment_reference
            .expect("awaiting payment must carry a reference")
    }

    pub async fn session(&self, customer: &str) -> Option<Session> {
        self.store.find(customer).await.unwrap()
    }

    pub async fn sent_to(&self, customer: &str) -> Vec<OutboundMessage> {
        self.messenger.sent_to(customer).await
    }

    /// The last message sent to `customer`.
    pub async fn last_reply(&self, customer: &str) -> OutboundMessage {
        self.sent_to(customer)
            .await
            .pop()
            .expect("customer should have received a reply")
    }

    /// Polls until `customer` has received at least `count` messages.
    pub async fn wait_for_replies(&self, customer: &str, count: usize) -> Vec<OutboundMessage> {
        for _ in 0..100 {
            let sent = self.sent_to(customer).await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {count} replies to {customer}");
    }

    /// POSTs a Paystack webhook body, signed unless `signature` overrides it.
    pub async fn post_paystack_webhook(
        &self,
        body: Vec<u8>,
        signature: Option<&str>,
    ) -> reqwest::Response {
        let signature = match signature {
            Some(signature) => signature.to_string(),
            None => self.gateway.sign(&body).unwrap(),
        };
        self.client
            .post(self.url("/api/v1/payments/paystack/webhook"))
            .header("content-type", "application/json")
            .header("x-paystack-signature", signature)
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

async fn seed(catalog: &InMemoryCatalog) -> Fixtures {
    let rice = Category {
        id: Uuid::now_v7(),
        name: "Rice Dishes".to_string(),
        description: Some("Jollof, fried rice and friends".to_string()),
        is_active: true,
    };
    let grills = Category {
        id: Uuid::now_v7(),
        name: "Grills".to_string(),
        description: None,
        is_active: true,
    };
    let restaurant_id = Uuid::now_v7();
    let food = |name: &str, price: i64, category: &Category, tags: &[&str]| FoodItem {
        id: Uuid::now_v7(),
        name: name.to_string(),
        description: format!("Freshly made {}", name.to_lowercase()),
        price,
        category_id: category.id,
        restaurant_id,
        restaurant_name: "Mama Put Kitchen".to_string(),
        delivery_time: "30-45 mins".to_string(),
        preparation_time: "20 mins".to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        is_available: true,
    };

    let jollof = food("Jollof Rice", 250_000, &rice, &["rice", "nigerian"]);
    let fried_rice = food("Fried Rice", 270_000, &rice, &["rice"]);
    let suya = food("Beef Suya", 150_000, &grills, &["grill", "spicy"]);

    catalog.insert_category(rice.clone()).await;
    catalog.insert_category(grills.clone()).await;
    for item in [&jollof, &fried_rice, &suya] {
        catalog.insert_food(item.clone()).await;
    }

    Fixtures {
        rice,
        grills,
        jollof,
        fried_rice,
        suya,
    }
}
