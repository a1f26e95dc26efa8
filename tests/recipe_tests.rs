mod common;

use foodgram::db::entities::{favorite, recipe_ingredient, recipe_tag, shopping_cart};
use foodgram::db::services::{
    CollectionError, IngredientError, RecipeCollection, RecipeDraft, RecipeError, RecipeFilter,
    RecipeService, collection_service, ingredient_service, shopping_list_service, tag_service,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use tokio::sync::Barrier;

use common::{
    create_ingredient, create_recipe, create_tag, create_user, draft, setup_db, setup_shared_db,
};

#[tokio::test]
async fn deleting_a_recipe_removes_links_favorites_and_cart_rows() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let fan = create_user(&db, "fan").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let eggs = create_ingredient(&db, "eggs", "pcs").await;
    let breakfast = create_tag(&db, "breakfast").await;

    let recipe = create_recipe(
        &db,
        author.id,
        "Pancakes",
        &[(flour.id, 20), (eggs.id, 2)],
        &[breakfast.id],
    )
    .await;
    collection_service::add(&db, RecipeCollection::Favorites, fan.id, recipe.id)
        .await
        .unwrap();
    collection_service::add(&db, RecipeCollection::ShoppingCart, fan.id, recipe.id)
        .await
        .unwrap();

    RecipeService::delete_recipe(&db, recipe.id, author.id)
        .await
        .unwrap();

    assert_eq!(recipe_ingredient::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(recipe_tag::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(favorite::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(shopping_cart::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn referenced_ingredient_is_protected() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let salt = create_ingredient(&db, "salt", "pinch").await;
    let bread = create_tag(&db, "bread").await;
    create_recipe(&db, author.id, "Bread", &[(flour.id, 50)], &[bread.id]).await;

    let result = ingredient_service::delete_ingredient(&db, flour.id).await;
    assert!(matches!(result, Err(IngredientError::Protected(_))));
    assert!(ingredient_service::get_ingredient(&db, flour.id).await.is_ok());

    ingredient_service::delete_ingredient(&db, salt.id)
        .await
        .unwrap();
    assert!(matches!(
        ingredient_service::get_ingredient(&db, salt.id).await,
        Err(IngredientError::NotFound(_))
    ));
}

#[tokio::test]
async fn favoriting_twice_keeps_one_row() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let bread = create_tag(&db, "bread").await;
    let recipe = create_recipe(&db, author.id, "Bread", &[(flour.id, 50)], &[bread.id]).await;

    let short = collection_service::add(&db, RecipeCollection::Favorites, author.id, recipe.id)
        .await
        .unwrap();
    assert_eq!(short.id, recipe.id);
    assert_eq!(short.cooking_time, recipe.cooking_time);

    let again = collection_service::add(&db, RecipeCollection::Favorites, author.id, recipe.id).await;
    assert!(matches!(
        again,
        Err(CollectionError::AlreadyAdded(RecipeCollection::Favorites))
    ));
    assert_eq!(favorite::Entity::find().count(&db).await.unwrap(), 1);

    collection_service::remove(&db, RecipeCollection::Favorites, author.id, recipe.id)
        .await
        .unwrap();
    let missing = collection_service::remove(&db, RecipeCollection::Favorites, author.id, recipe.id).await;
    assert!(matches!(
        missing,
        Err(CollectionError::NotPresent(RecipeCollection::Favorites))
    ));

    let unknown = collection_service::add(&db, RecipeCollection::ShoppingCart, author.id, 999).await;
    assert!(matches!(unknown, Err(CollectionError::RecipeNotFound(999))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_favorites_create_one_row() {
    let (_dir, db) = setup_shared_db().await;
    let author = create_user(&db, "author").await;
    let fan = create_user(&db, "fan").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let bread = create_tag(&db, "bread").await;
    let recipe = create_recipe(&db, author.id, "Bread", &[(flour.id, 50)], &[bread.id]).await;
    let (fan_id, recipe_id) = (fan.id, recipe.id);

    let tasks = 16;
    let barrier = Arc::new(Barrier::new(tasks));
    let mut handles = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let db = db.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            collection_service::add(&db, RecipeCollection::Favorites, fan_id, recipe_id)
                .await
                .map(|_| ())
        }));
    }

    let mut added = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => added += 1,
            Err(CollectionError::AlreadyAdded(RecipeCollection::Favorites)) => {}
            Err(other) => panic!("unexpected favorite error: {other}"),
        }
    }
    assert_eq!(added, 1);
    assert_eq!(favorite::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn cooking_time_out_of_range_creates_nothing() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let bread = create_tag(&db, "bread").await;

    let too_long = RecipeDraft {
        cooking_time: 361,
        ..draft("Bread", &[(flour.id, 50)], &[bread.id])
    };
    let result = RecipeService::create_recipe(&db, author.id, too_long).await;
    assert!(matches!(result, Err(RecipeError::Invalid(_))));
    assert_eq!(RecipeService::count_by_author(&db, author.id).await.unwrap(), 0);

    let ok = RecipeDraft {
        cooking_time: 45,
        ..draft("Bread", &[(flour.id, 50)], &[bread.id])
    };
    let recipe = RecipeService::create_recipe(&db, author.id, ok).await.unwrap();
    assert_eq!(recipe.cooking_time, 45);
}

#[tokio::test]
async fn unknown_references_roll_back() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let bread = create_tag(&db, "bread").await;

    let result =
        RecipeService::create_recipe(&db, author.id, draft("Bread", &[(flour.id, 5), (77, 1)], &[bread.id]))
            .await;
    assert!(matches!(result, Err(RecipeError::UnknownIngredient(77))));

    let result =
        RecipeService::create_recipe(&db, author.id, draft("Bread", &[(flour.id, 5)], &[bread.id, 88]))
            .await;
    assert!(matches!(result, Err(RecipeError::UnknownTag(88))));

    assert_eq!(RecipeService::count_by_author(&db, author.id).await.unwrap(), 0);
    assert_eq!(recipe_ingredient::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn only_the_author_may_change_a_recipe() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let stranger = create_user(&db, "stranger").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let sugar = create_ingredient(&db, "sugar", "g").await;
    let bread = create_tag(&db, "bread").await;
    let sweet = create_tag(&db, "sweet").await;
    let recipe = create_recipe(&db, author.id, "Bread", &[(flour.id, 50)], &[bread.id]).await;

    let edit = draft("Sweet bread", &[(flour.id, 40), (sugar.id, 10)], &[sweet.id]);
    assert!(matches!(
        RecipeService::update_recipe(&db, recipe.id, stranger.id, edit.clone()).await,
        Err(RecipeError::Forbidden)
    ));
    assert!(matches!(
        RecipeService::delete_recipe(&db, recipe.id, stranger.id).await,
        Err(RecipeError::Forbidden)
    ));

    let updated = RecipeService::update_recipe(&db, recipe.id, author.id, edit)
        .await
        .unwrap();
    assert_eq!(updated.name, "Sweet bread");

    let stored = RecipeService::get_recipe(&db, recipe.id).await.unwrap();
    assert_eq!(stored.pub_date, recipe.pub_date);

    let detail = RecipeService::recipe_detail(&db, None, stored).await.unwrap();
    assert_eq!(detail.ingredients.len(), 2);
    assert_eq!(detail.ingredients[1].name, "sugar");
    assert_eq!(detail.ingredients[1].amount, 10);
    assert_eq!(detail.tags.len(), 1);
    assert_eq!(detail.tags[0].slug, "sweet");
    assert_eq!(detail.author.id, author.id);
    assert!(!detail.is_favorited);
}

#[tokio::test]
async fn shopping_list_sums_shared_ingredients() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let shopper = create_user(&db, "shopper").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let eggs = create_ingredient(&db, "eggs", "pcs").await;
    let milk = create_ingredient(&db, "milk", "ml").await;
    let breakfast = create_tag(&db, "breakfast").await;

    let pancakes = create_recipe(
        &db,
        author.id,
        "Pancakes",
        &[(flour.id, 20), (eggs.id, 2)],
        &[breakfast.id],
    )
    .await;
    let waffles = create_recipe(
        &db,
        author.id,
        "Waffles",
        &[(flour.id, 30), (eggs.id, 3)],
        &[breakfast.id],
    )
    .await;
    // Not in the cart.
    create_recipe(&db, author.id, "Latte", &[(milk.id, 50)], &[breakfast.id]).await;

    for recipe_id in [pancakes.id, waffles.id] {
        collection_service::add(&db, RecipeCollection::ShoppingCart, shopper.id, recipe_id)
            .await
            .unwrap();
    }

    let items = shopping_list_service::shopping_list(&db, shopper.id)
        .await
        .unwrap();
    assert_eq!(
        shopping_list_service::render(&items),
        "eggs (pcs) - 5\nflour (g) - 50\n"
    );

    let empty = shopping_list_service::shopping_list(&db, author.id)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn feed_filters_and_ordering() {
    let db = setup_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let breakfast = create_tag(&db, "breakfast").await;
    let dinner = create_tag(&db, "dinner").await;

    let first = create_recipe(&db, alice.id, "Porridge", &[(flour.id, 5)], &[breakfast.id]).await;
    let second = create_recipe(&db, bob.id, "Stew", &[(flour.id, 5)], &[dinner.id]).await;
    let third = create_recipe(
        &db,
        bob.id,
        "Omelette",
        &[(flour.id, 5)],
        &[breakfast.id, dinner.id],
    )
    .await;

    let (all, total) = RecipeService::list_recipes(&db, &RecipeFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 3);
    let ids: Vec<i32> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let by_tag = RecipeFilter {
        tag_slugs: vec!["breakfast".to_string()],
        ..Default::default()
    };
    let (tagged, _) = RecipeService::list_recipes(&db, &by_tag, 1, 10).await.unwrap();
    let ids: Vec<i32> = tagged.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);

    let unknown_tag = RecipeFilter {
        tag_slugs: vec!["brunch".to_string()],
        ..Default::default()
    };
    let (none, total) = RecipeService::list_recipes(&db, &unknown_tag, 1, 10).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);

    let by_author = RecipeFilter {
        author_id: Some(alice.id),
        ..Default::default()
    };
    let (mine, _) = RecipeService::list_recipes(&db, &by_author, 1, 10).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);

    collection_service::add(&db, RecipeCollection::Favorites, alice.id, second.id)
        .await
        .unwrap();
    let favorites = RecipeFilter {
        favorited_by: Some(alice.id),
        ..Default::default()
    };
    let (liked, _) = RecipeService::list_recipes(&db, &favorites, 1, 10).await.unwrap();
    assert_eq!(liked.len(), 1);

    let details = RecipeService::recipe_details(&db, Some(alice.id), liked)
        .await
        .unwrap();
    assert!(details[0].is_favorited);
    assert!(!details[0].is_in_shopping_cart);
}

#[tokio::test]
async fn deleting_a_tag_unlinks_recipes() {
    let db = setup_db().await;
    let author = create_user(&db, "author").await;
    let flour = create_ingredient(&db, "flour", "g").await;
    let bread = create_tag(&db, "bread").await;
    let baking = create_tag(&db, "baking").await;
    let recipe = create_recipe(
        &db,
        author.id,
        "Bread",
        &[(flour.id, 50)],
        &[bread.id, baking.id],
    )
    .await;

    tag_service::delete_tag(&db, baking.id).await.unwrap();

    let detail = RecipeService::recipe_detail(&db, None, recipe).await.unwrap();
    assert_eq!(detail.tags.len(), 1);
    assert_eq!(detail.tags[0].id, bread.id);
}

#[tokio::test]
async fn ingredient_search_is_case_insensitive_prefix() {
    let db = setup_db().await;
    create_ingredient(&db, "Sugar", "g").await;
    create_ingredient(&db, "salt", "pinch").await;
    create_ingredient(&db, "sour cream", "g").await;
    create_ingredient(&db, "flour", "g").await;

    let found = ingredient_service::list_ingredients(&db, Some("S"))
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert!(!names.contains(&"flour"));

    let all = ingredient_service::list_ingredients(&db, None).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn ingredient_search_matches_wildcards_literally_and_folds_cyrillic() {
    let db = setup_db().await;
    create_ingredient(&db, "50% cream", "ml").await;
    create_ingredient(&db, "500 g flour", "g").await;
    create_ingredient(&db, "Мука", "g").await;
    create_ingredient(&db, "молоко", "ml").await;

    let names = |found: Vec<foodgram::db::entities::ingredient::Model>| {
        found.into_iter().map(|i| i.name).collect::<Vec<_>>()
    };

    let percent = ingredient_service::list_ingredients(&db, Some("50%"))
        .await
        .unwrap();
    assert_eq!(names(percent), vec!["50% cream".to_string()]);

    let underscore = ingredient_service::list_ingredients(&db, Some("5_"))
        .await
        .unwrap();
    assert!(underscore.is_empty());

    let cyrillic = ingredient_service::list_ingredients(&db, Some("МУК"))
        .await
        .unwrap();
    assert_eq!(names(cyrillic), vec!["Мука".to_string()]);

    let both = ingredient_service::list_ingredients(&db, Some("м"))
        .await
        .unwrap();
    assert_eq!(both.len(), 2);
}
