//! Saved-city management and the "weather for my cities" aggregation.
//!
//! Every operation works on the already-authenticated [`User`] and, when it
//! mutates the list, commits it with exactly one [`UserStore::save`]. There is
//! no rollback: if the save fails the in-memory record keeps the change.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::WeatherError,
    model::{CityWeather, NewSavedCity, SavedCity, SavedCityPatch, User},
    provider::WeatherProvider,
    store::UserStore,
};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone)]
pub struct SavedCities {
    store: Arc<dyn UserStore>,
    provider: Arc<dyn WeatherProvider>,
}

impl SavedCities {
    pub fn new(store: Arc<dyn UserStore>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn WeatherProvider> {
        &self.provider
    }

    pub async fn add(&self, user: &mut User, input: NewSavedCity) -> Result<SavedCity, WeatherError> {
        input.validate()?;

        let cities = user.saved_cities.get_or_insert_with(Vec::new);

        if cities.iter().any(|c| c.same_place(&input.name, &input.country)) {
            return Err(WeatherError::DuplicateCity);
        }

        let city = SavedCity {
            id: generate_city_id(),
            name: input.name,
            country: input.country,
            coordinates: input.coordinates,
            person_name: input.person_name,
            relationship: input.relationship,
            is_favorite: input.is_favorite.unwrap_or(false),
            added_date: Utc::now(),
        };
        cities.push(city.clone());

        self.store.save(user).await?;

        info!(
            "Added saved city for user {}: {}, {}",
            user.email, city.name, city.country
        );
        Ok(city)
    }

    /// A user who never saved anything simply has no cities.
    pub fn list(&self, user: &User) -> Vec<SavedCity> {
        user.saved_cities.clone().unwrap_or_default()
    }

    pub async fn update(
        &self,
        user: &mut User,
        city_id: &str,
        patch: SavedCityPatch,
    ) -> Result<SavedCity, WeatherError> {
        let cities = user.saved_cities.as_mut().ok_or(WeatherError::NoSavedCities)?;
        let city = cities
            .iter_mut()
            .find(|c| c.id == city_id)
            .ok_or(WeatherError::CityNotFound)?;

        patch.apply_to(city);
        let updated = city.clone();

        self.store.save(user).await?;

        info!("Updated saved city for user {}: {}", user.email, updated.name);
        Ok(updated)
    }

    pub async fn delete(&self, user: &mut User, city_id: &str) -> Result<(), WeatherError> {
        let cities = user.saved_cities.as_mut().ok_or(WeatherError::NoSavedCities)?;
        let index = cities
            .iter()
            .position(|c| c.id == city_id)
            .ok_or(WeatherError::CityNotFound)?;

        let removed = cities.remove(index);

        self.store.save(user).await?;

        info!("Deleted saved city for user {}: {}", user.email, removed.name);
        Ok(())
    }

    /// Fetches weather for each saved city in order, one at a time.
    ///
    /// A failed lookup yields [`CityWeather::Partial`] for that city and is
    /// otherwise only logged.
    pub async fn weather_for_saved_cities(&self, user: &User) -> Vec<CityWeather> {
        let cities = user.saved_cities.as_deref().unwrap_or_default();
        let mut out = Vec::with_capacity(cities.len());

        for city in cities {
            match self.provider.fetch(&city.name, Some(&city.country)).await {
                Ok(weather) => out.push(CityWeather::Complete(city.clone(), weather)),
                Err(e) => {
                    warn!(city = %city.name, error = %e, "Failed to get weather for saved city");
                    out.push(CityWeather::Partial(city.clone()));
                }
            }
        }

        out
    }
}

/// `city_<unix millis>_<9 random base36 chars>`.
fn generate_city_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("city_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::StoreError,
        model::{Coordinates, Temperature, WeatherSnapshot, Wind},
        store::InMemoryUserStore,
    };
    use async_trait::async_trait;
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };

    /// Succeeds for every city except the ones listed in `failing`.
    #[derive(Debug, Default)]
    struct FakeProvider {
        failing: HashSet<String>,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch(
            &self,
            city: &str,
            country: Option<&str>,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.lock().unwrap().push(city.to_string());
            if self.failing.contains(city) {
                return Err(WeatherError::FetchFailed("boom".into()));
            }
            Ok(snapshot(city, country.unwrap_or_default()))
        }
    }

    /// Counts saves, optionally failing all of them.
    #[derive(Debug, Default)]
    struct CountingStore {
        saves: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn load_by_session(&self, _token: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn save(&self, _user: &User) -> Result<(), StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    fn snapshot(city: &str, country: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            coordinates: Coordinates { latitude: 0.0, longitude: 0.0 },
            conditions: Vec::new(),
            temperature: Temperature { current: 20.0, feels_like: 19.0, min: 15.0, max: 25.0 },
            pressure: 1013.0,
            humidity: 50,
            wind: Wind { speed: 3.0, direction: 90.0 },
            cloud_coverage: 10,
            country: country.to_string(),
            sunrise: 0,
            sunset: 0,
            city_name: city.to_string(),
            status_code: 200,
        }
    }

    fn new_city(name: &str, country: &str) -> NewSavedCity {
        NewSavedCity {
            name: name.into(),
            country: country.into(),
            coordinates: Coordinates { latitude: 48.85, longitude: 2.35 },
            person_name: None,
            relationship: None,
            is_favorite: None,
        }
    }

    fn service_with(store: Arc<dyn UserStore>, provider: FakeProvider) -> SavedCities {
        SavedCities::new(store, Arc::new(provider))
    }

    fn service() -> (SavedCities, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        (service_with(store.clone(), FakeProvider::default()), store)
    }

    fn user() -> User {
        User::new("u1", "someone@example.com")
    }

    #[tokio::test]
    async fn add_defaults_favorite_and_persists_once() {
        let (svc, store) = service();
        let mut user = user();

        let city = svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();

        assert!(!city.is_favorite);
        assert!(city.id.starts_with("city_"));
        assert_eq!(user.saved_cities.as_deref(), Some(&[city][..]));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_duplicate_is_rejected_without_mutation() {
        let (svc, store) = service();
        let mut user = user();
        let mut first = new_city("Paris", "FR");
        first.person_name = Some("Marie".into());
        svc.add(&mut user, first).await.unwrap();
        let before = user.clone();

        let mut again = new_city("Paris", "FR");
        again.person_name = Some("Pierre".into());
        let err = svc.add(&mut user, again).await.unwrap_err();

        assert!(matches!(err, WeatherError::DuplicateCity));
        assert_eq!(user, before);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_rejects_invalid_input_without_mutation() {
        let (svc, store) = service();
        let mut user = user();
        let mut input = new_city("Paris", "FR");
        input.coordinates.longitude = 200.0;

        let err = svc.add(&mut user, input).await.unwrap_err();
        assert!(matches!(err, WeatherError::Invalid(_)));

        let err = svc.add(&mut user, new_city("", "FR")).await.unwrap_err();
        assert!(matches!(err, WeatherError::Invalid(_)));

        assert!(user.saved_cities.is_none());
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_name_in_other_country_is_not_a_duplicate() {
        let (svc, _) = service();
        let mut user = user();

        svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();
        svc.add(&mut user, new_city("Paris", "US")).await.unwrap();

        assert_eq!(svc.list(&user).len(), 2);
    }

    #[tokio::test]
    async fn list_returns_cities_in_insertion_order() {
        let (svc, _) = service();
        let mut user = user();

        svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();
        svc.add(&mut user, new_city("Berlin", "DE")).await.unwrap();

        let names: Vec<_> = svc.list(&user).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Paris", "Berlin"]);
    }

    #[test]
    fn list_without_saved_cities_is_empty() {
        let (svc, _) = service();
        assert!(svc.list(&user()).is_empty());
    }

    #[tokio::test]
    async fn update_unknown_id_leaves_list_unchanged() {
        let (svc, store) = service();
        let mut user = user();
        svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();
        let before = user.clone();

        let patch = SavedCityPatch { is_favorite: Some(true), ..Default::default() };
        let err = svc.update(&mut user, "city_missing", patch).await.unwrap_err();

        assert!(matches!(err, WeatherError::CityNotFound));
        assert_eq!(user, before);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let (svc, _) = service();
        let mut user = user();
        let mut input = new_city("Paris", "FR");
        input.person_name = Some("Marie".into());
        input.relationship = Some("Family".into());
        let city = svc.add(&mut user, input).await.unwrap();

        let patch = SavedCityPatch { is_favorite: Some(true), ..Default::default() };
        let updated = svc.update(&mut user, &city.id, patch).await.unwrap();

        assert!(updated.is_favorite);
        assert_eq!(updated.person_name.as_deref(), Some("Marie"));
        assert_eq!(updated.relationship.as_deref(), Some("Family"));
        assert_eq!(svc.list(&user), vec![updated]);
    }

    #[tokio::test]
    async fn update_and_delete_without_list_report_no_saved_cities() {
        let (svc, store) = service();
        let mut user = user();

        let err = svc.update(&mut user, "x", SavedCityPatch::default()).await.unwrap_err();
        assert!(matches!(err, WeatherError::NoSavedCities));

        let err = svc.delete(&mut user, "x").await.unwrap_err();
        assert!(matches!(err, WeatherError::NoSavedCities));

        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_keeps_order() {
        let (svc, store) = service();
        let mut user = user();
        let paris = svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();
        svc.add(&mut user, new_city("Berlin", "DE")).await.unwrap();
        svc.add(&mut user, new_city("Rome", "IT")).await.unwrap();

        svc.delete(&mut user, &paris.id).await.unwrap();

        let places: Vec<_> = svc.list(&user).into_iter().map(|c| (c.name, c.country)).collect();
        assert_eq!(
            places,
            [("Berlin".to_string(), "DE".to_string()), ("Rome".to_string(), "IT".to_string())]
        );
        assert_eq!(store.saves.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let (svc, _) = service();
        let mut user = user();
        svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();

        let err = svc.delete(&mut user, "city_missing").await.unwrap_err();

        assert!(matches!(err, WeatherError::CityNotFound));
        assert_eq!(svc.list(&user).len(), 1);
    }

    #[tokio::test]
    async fn failed_save_surfaces_store_error_but_keeps_mutation() {
        let store = Arc::new(CountingStore { fail: true, ..Default::default() });
        let svc = service_with(store, FakeProvider::default());
        let mut user = user();

        let err = svc.add(&mut user, new_city("Paris", "FR")).await.unwrap_err();

        assert!(matches!(err, WeatherError::Store(_)));
        assert_eq!(svc.list(&user).len(), 1);
    }

    #[tokio::test]
    async fn mutations_reach_the_store() {
        let store = Arc::new(InMemoryUserStore::with_users(vec![user().with_session("t")]));
        let svc = service_with(store.clone(), FakeProvider::default());
        let mut user = store.load_by_session("t").await.unwrap().unwrap();

        let city = svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();

        let stored = store.get("u1").await.unwrap();
        assert_eq!(stored.saved_cities, Some(vec![city]));
    }

    #[tokio::test]
    async fn aggregation_tolerates_individual_failures_in_order() {
        let store = Arc::new(CountingStore::default());
        let svc = service_with(store.clone(), FakeProvider::failing(&["Berlin", "Oslo"]));
        let mut user = user();
        for (name, country) in [("Paris", "FR"), ("Berlin", "DE"), ("Rome", "IT"), ("Oslo", "NO")] {
            svc.add(&mut user, new_city(name, country)).await.unwrap();
        }
        let saves_before = store.saves.load(Ordering::SeqCst);

        let out = svc.weather_for_saved_cities(&user).await;

        let names: Vec<_> = out.iter().map(|c| c.city().name.as_str()).collect();
        assert_eq!(names, ["Paris", "Berlin", "Rome", "Oslo"]);
        assert_eq!(out.iter().filter(|c| c.weather().is_some()).count(), 2);
        assert!(matches!(out[1], CityWeather::Partial(_)));
        assert_eq!(out[2].weather().map(|w| w.country.as_str()), Some("IT"));
        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before);
    }

    #[tokio::test]
    async fn aggregation_queries_sequentially_in_list_order() {
        let provider = Arc::new(FakeProvider::default());
        let svc = SavedCities::new(Arc::new(CountingStore::default()), provider.clone());
        let mut user = user();
        svc.add(&mut user, new_city("Paris", "FR")).await.unwrap();
        svc.add(&mut user, new_city("Berlin", "DE")).await.unwrap();

        svc.weather_for_saved_cities(&user).await;

        assert_eq!(*provider.calls.lock().unwrap(), ["Paris", "Berlin"]);
    }

    #[tokio::test]
    async fn aggregation_without_saved_cities_is_empty() {
        let (svc, _) = service();
        assert!(svc.weather_for_saved_cities(&user()).await.is_empty());
    }

    #[test]
    fn generated_ids_have_expected_shape_and_differ() {
        let a = generate_city_id();
        let b = generate_city_id();

        let parts: Vec<_> = a.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "city");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
        assert_ne!(a, b);
    }
}
