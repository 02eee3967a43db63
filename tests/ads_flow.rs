mod common;

use classifieds_api::{
    dto::{ads::AdPayload, auth::RegisterRequest},
    entity::Users,
    error::AppError,
    middleware::auth::Principal,
    models::Price,
    routes::params::{AdQuery, ModerationQuery},
    services::{
        ad_service::{self, WriteMode},
        admin_service, auth_service, favorite_service,
    },
};
use common::{create_ad, create_user, principal, setup_state, unique_tag};
use sea_orm::EntityTrait;
use serde_json::json;

fn search(tag: &str) -> AdQuery {
    AdQuery {
        q: Some(tag.to_string()),
        ..AdQuery::default()
    }
}

// Owner submits -> hidden from everyone but owner and staff -> staff approves -> public.
#[tokio::test]
async fn unapproved_ads_are_hidden_until_approved() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let stranger = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;
    let tag = unique_tag();

    let ad = create_ad(&state, &owner, &format!("Bike {tag}"), "100.00").await?;
    assert!(!ad.is_approved);
    assert!(ad.is_owner);

    for viewer in [Principal::Anonymous, principal(&stranger)] {
        let err = ad_service::get_ad(&state, &viewer, ad.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let listed = ad_service::list_ads(&state, &viewer, search(&tag)).await?;
        assert!(listed.data.unwrap().items.is_empty());
    }

    let as_owner = ad_service::get_ad(&state, &principal(&owner), ad.id).await?;
    assert_eq!(as_owner.data.unwrap().id, ad.id);
    let owner_list = ad_service::list_ads(&state, &principal(&owner), search(&tag)).await?;
    assert_eq!(owner_list.data.unwrap().items.len(), 1);
    let staff_list = ad_service::list_ads(&state, &principal(&staff), search(&tag)).await?;
    assert_eq!(staff_list.data.unwrap().items.len(), 1);

    let approved = ad_service::set_approval(&state, &staff, ad.id, true).await?;
    let approved = approved.data.unwrap();
    assert!(approved.is_approved);
    assert_eq!(approved.updated_at, ad.updated_at);

    let public = ad_service::get_ad(&state, &Principal::Anonymous, ad.id).await?;
    assert!(public.data.unwrap().is_approved);

    let rejected = ad_service::set_approval(&state, &staff, ad.id, false).await?;
    assert!(!rejected.data.unwrap().is_approved);
    let err = ad_service::get_ad(&state, &Principal::Anonymous, ad.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn created_ads_ignore_client_supplied_ownership_and_approval() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let other = create_user(&state, false).await?;

    let payload: AdPayload = serde_json::from_value(json!({
        "title": "Sofa",
        "description": "Three seats",
        "price": 250,
        "is_approved": true,
        "owner": { "id": other.user_id, "username": other.username },
        "favorites_count": 99
    }))?;
    let ad = ad_service::create_ad(&state, &owner, payload).await?.data.unwrap();

    assert!(!ad.is_approved);
    assert_eq!(ad.owner.id, owner.user_id);
    assert_eq!(ad.owner.username, owner.username);
    assert_eq!(ad.favorites_count, 0);
    assert_eq!(ad.price, Price::from_cents(25_000));

    let staff = create_user(&state, true).await?;
    let staff_ad = create_ad(&state, &staff, "Staff lamp", "5").await?;
    assert!(!staff_ad.is_approved);

    Ok(())
}

#[tokio::test]
async fn only_staff_may_moderate() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let ad = create_ad(&state, &owner, "Kettle", "12.00").await?;

    for approved in [true, false] {
        let err = ad_service::set_approval(&state, &owner, ad.id, approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    let err = admin_service::list_moderation_queue(&state, &owner, ModerationQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn writes_are_limited_to_owner_and_staff() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let stranger = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;

    let ad = create_ad(&state, &owner, "Guitar", "300").await?;
    let patch = AdPayload {
        price: Some(json!("275.50")),
        ..AdPayload::default()
    };

    // Unapproved: strangers cannot even see it.
    let err = ad_service::update_ad(&state, &stranger, ad.id, patch.clone(), WriteMode::Partial)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    ad_service::set_approval(&state, &staff, ad.id, true).await?;

    // Approved: visible, but still not theirs.
    let err = ad_service::update_ad(&state, &stranger, ad.id, patch.clone(), WriteMode::Partial)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = ad_service::delete_ad(&state, &stranger, ad.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let updated = ad_service::update_ad(&state, &owner, ad.id, patch, WriteMode::Partial)
        .await?
        .data
        .unwrap();
    assert_eq!(updated.price.to_string(), "275.50");
    assert_eq!(updated.title, "Guitar");
    assert!(updated.is_approved);
    assert!(updated.updated_at >= ad.updated_at);

    let incomplete = AdPayload {
        title: Some("Bass guitar".into()),
        ..AdPayload::default()
    };
    let err = ad_service::update_ad(&state, &owner, ad.id, incomplete, WriteMode::Replace)
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            assert!(errors.contains("description"));
            assert!(errors.contains("price"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let replaced = ad_service::update_ad(
        &state,
        &staff,
        ad.id,
        AdPayload {
            title: Some("Bass guitar".into()),
            description: Some("Four strings".into()),
            price: Some(json!(310)),
        },
        WriteMode::Replace,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(replaced.title, "Bass guitar");
    assert_eq!(replaced.owner.id, owner.user_id);

    ad_service::delete_ad(&state, &owner, ad.id).await?;
    let err = ad_service::get_ad(&state, &principal(&owner), ad.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn favoriting_is_idempotent() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let fan = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;
    let ad = create_ad(&state, &owner, "Vinyl records", "40").await?;

    // Not visible to the fan yet.
    let err = favorite_service::favorite_ad(&state, &fan, ad.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    ad_service::set_approval(&state, &staff, ad.id, true).await?;

    for _ in 0..2 {
        let status = favorite_service::favorite_ad(&state, &fan, ad.id).await?.data.unwrap();
        assert!(status.is_favorited);
        assert_eq!(status.favorites_count, 1);
    }
    assert_eq!(
        favorite_service::count_for_pair(&state.orm, fan.user_id, ad.id).await?,
        1
    );

    let seen_by_fan = ad_service::get_ad(&state, &principal(&fan), ad.id).await?.data.unwrap();
    assert!(seen_by_fan.is_favorited);
    assert_eq!(seen_by_fan.favorites_count, 1);
    let seen_by_owner = ad_service::get_ad(&state, &principal(&owner), ad.id).await?.data.unwrap();
    assert!(!seen_by_owner.is_favorited);
    assert_eq!(seen_by_owner.favorites_count, 1);

    let favorites =
        ad_service::list_favorite_ads(&state, &fan, AdQuery::default()).await?;
    let favorites = favorites.data.unwrap().items;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, ad.id);

    for _ in 0..2 {
        let status = favorite_service::unfavorite_ad(&state, &fan, ad.id).await?.data.unwrap();
        assert!(!status.is_favorited);
        assert_eq!(status.favorites_count, 0);
    }

    let favorites =
        ad_service::list_favorite_ads(&state, &fan, AdQuery::default()).await?;
    assert!(favorites.data.unwrap().items.is_empty());

    Ok(())
}

#[tokio::test]
async fn deleting_an_ad_removes_its_favorites() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, false).await?;
    let ad = create_ad(&state, &owner, "Tent", "80").await?;

    favorite_service::favorite_ad(&state, &owner, ad.id).await?;
    ad_service::delete_ad(&state, &owner, ad.id).await?;

    assert_eq!(favorite_service::count_for_ad(&state.orm, ad.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_ordering_compose() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let seller = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;
    let tag = unique_tag();

    let mut ids = Vec::new();
    for price in ["10", "20", "30"] {
        let ad = create_ad(&state, &seller, &format!("Chair {tag} {price}"), price).await?;
        ad_service::set_approval(&state, &staff, ad.id, true).await?;
        ids.push(ad.id);
    }

    let in_range = ad_service::list_ads(
        &state,
        &Principal::Anonymous,
        AdQuery {
            min_price: Some("15".into()),
            max_price: Some("25".into()),
            ..search(&tag)
        },
    )
    .await?;
    let in_range = in_range.data.unwrap().items;
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].price, Price::from_cents(2000));

    let by_price = ad_service::list_ads(
        &state,
        &Principal::Anonymous,
        AdQuery {
            ordering: Some("price".into()),
            ..search(&tag)
        },
    )
    .await?;
    let prices: Vec<String> = by_price
        .data
        .unwrap()
        .items
        .iter()
        .map(|ad| ad.price.to_string())
        .collect();
    assert_eq!(prices, ["10.00", "20.00", "30.00"]);

    let fallback = ad_service::list_ads(
        &state,
        &Principal::Anonymous,
        AdQuery {
            ordering: Some("bogus".into()),
            ..search(&tag)
        },
    )
    .await?;
    let newest_first: Vec<_> = fallback.data.unwrap().items.iter().map(|ad| ad.id).collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(newest_first, expected);

    // Description matches too, case-insensitively.
    let by_description = ad_service::list_ads(
        &state,
        &Principal::Anonymous,
        AdQuery {
            search: Some(format!("DESCRIPTION OF CHAIR {}", tag.to_uppercase())),
            ..AdQuery::default()
        },
    )
    .await?;
    assert_eq!(by_description.data.unwrap().items.len(), 3);

    let paged = ad_service::list_ads(
        &state,
        &Principal::Anonymous,
        AdQuery {
            per_page: Some(2),
            page: Some(2),
            ..search(&tag)
        },
    )
    .await?;
    let meta = paged.meta.unwrap();
    assert_eq!(meta.total, Some(3));
    assert_eq!(paged.data.unwrap().items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn mine_includes_unapproved_and_queue_filters_by_state() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let seller = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;
    let tag = unique_tag();

    let pending = create_ad(&state, &seller, &format!("Pending {tag}"), "1").await?;
    let live = create_ad(&state, &seller, &format!("Live {tag}"), "2").await?;
    ad_service::set_approval(&state, &staff, live.id, true).await?;

    let mine = ad_service::list_my_ads(&state, &seller, AdQuery::default()).await?;
    let mine = mine.data.unwrap().items;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|ad| ad.is_owner));

    let queue = admin_service::list_moderation_queue(
        &state,
        &staff,
        ModerationQuery {
            q: Some(tag.clone()),
            is_approved: Some(false),
            ..ModerationQuery::default()
        },
    )
    .await?;
    let queue = queue.data.unwrap().items;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, pending.id);

    let by_owner = admin_service::list_moderation_queue(
        &state,
        &staff,
        ModerationQuery {
            q: Some(seller.username.clone()),
            ..ModerationQuery::default()
        },
    )
    .await?;
    assert_eq!(by_owner.data.unwrap().items.len(), 2);

    Ok(())
}

#[tokio::test]
async fn favorites_list_honours_listing_filters() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let seller = create_user(&state, false).await?;
    let fan = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;
    let tag = unique_tag();

    for (title, price) in [("Lamp", "15"), ("Rug", "60"), ("Clock", "35")] {
        let ad = create_ad(&state, &seller, &format!("{title} {tag}"), price).await?;
        ad_service::set_approval(&state, &staff, ad.id, true).await?;
        favorite_service::favorite_ad(&state, &fan, ad.id).await?;
    }

    let cheap = ad_service::list_favorite_ads(
        &state,
        &fan,
        AdQuery {
            max_price: Some("40".into()),
            ordering: Some("-price".into()),
            ..AdQuery::default()
        },
    )
    .await?;
    let prices: Vec<String> = cheap
        .data
        .unwrap()
        .items
        .iter()
        .map(|ad| ad.price.to_string())
        .collect();
    assert_eq!(prices, ["35.00", "15.00"]);

    let rug = ad_service::list_favorite_ads(&state, &fan, search(&format!("rug {tag}"))).await?;
    let rug = rug.data.unwrap().items;
    assert_eq!(rug.len(), 1);
    assert!(rug[0].is_favorited);

    let err = ad_service::list_favorite_ads(
        &state,
        &fan,
        AdQuery {
            min_price: Some("free".into()),
            ..AdQuery::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_ads_favorites_and_token() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let username = format!("gone_{}", unique_tag());
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            username: Some(username.clone()),
            email: None,
            password: Some("123456".into()),
        },
    )
    .await?
    .data
    .unwrap();
    let leaving = auth_service::resolve_token(&state, &registered.token)
        .await?
        .ok_or_else(|| anyhow::anyhow!("token did not resolve"))?;

    let other = create_user(&state, false).await?;
    let staff = create_user(&state, true).await?;

    let own_ad = create_ad(&state, &leaving, "Leaving sale", "10").await?;
    let other_ad = create_ad(&state, &other, "Still here", "20").await?;
    ad_service::set_approval(&state, &staff, other_ad.id, true).await?;
    favorite_service::favorite_ad(&state, &leaving, other_ad.id).await?;
    favorite_service::favorite_ad(&state, &leaving, own_ad.id).await?;

    Users::delete_by_id(leaving.user_id).exec(&state.orm).await?;

    let err = ad_service::get_ad(&state, &principal(&staff), own_ad.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(favorite_service::count_for_ad(&state.orm, other_ad.id).await?, 0);
    assert_eq!(
        favorite_service::count_for_pair(&state.orm, leaving.user_id, own_ad.id).await?,
        0
    );
    assert!(
        auth_service::resolve_token(&state, &registered.token)
            .await?
            .is_none()
    );
    let still_here = ad_service::get_ad(&state, &Principal::Anonymous, other_ad.id).await?;
    assert_eq!(still_here.data.unwrap().favorites_count, 0);

    Ok(())
}
