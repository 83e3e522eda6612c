//! Domain values rendered as API responses.

use inkpost_core::domain::{Category, Comment, Location, Post, PostDraft, PostSummary, User};
use inkpost_core::pagination::Page;
use inkpost_core::services::{PostDetail, PostFormChoices};
use inkpost_shared::dto::{
    AccountResponse, AuthorResponse, CategoryResponse, CommentResponse, LocationResponse,
    PageResponse, PostDetailResponse, PostFormResponse, PostFormValues, PostResponse,
};

pub fn account(user: &User) -> AccountResponse {
    AccountResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_staff: user.is_staff,
        created_at: user.created_at,
    }
}

pub fn author(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        joined_at: user.created_at,
    }
}

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
    }
}

pub fn location(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name.clone(),
    }
}

pub fn post(post: &Post, comment_count: Option<u64>) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date,
        is_published: post.is_published,
        category_id: post.category_id,
        location_id: post.location_id,
        image: post.image.clone(),
        created_at: post.created_at,
        comment_count,
    }
}

pub fn comment(comment: &Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author_id: comment.author_id,
        text: comment.text.clone(),
        created_at: comment.created_at,
    }
}

pub fn feed(page: Page<PostSummary>) -> PageResponse<PostResponse> {
    let next_page = page.next_page_number();
    let previous_page = page.previous_page_number();
    let page = page.map(|summary| post(&summary.post, Some(summary.comment_count)));

    PageResponse {
        items: page.items,
        number: page.number,
        total_pages: page.total_pages,
        total_items: page.total_items,
        has_next: page.has_next,
        has_previous: page.has_previous,
        next_page,
        previous_page,
    }
}

pub fn detail(detail: &PostDetail) -> PostDetailResponse {
    let comment_count = detail.comments.len() as u64;
    PostDetailResponse {
        post: post(&detail.post, Some(comment_count)),
        author: author(&detail.author),
        category: detail.category.as_ref().map(category),
        location: detail.location.as_ref().map(location),
        comments: detail.comments.iter().map(comment).collect(),
        comment_count,
        comments_open: detail.comments_open,
    }
}

pub fn post_form(draft: PostDraft, choices: &PostFormChoices) -> PostFormResponse {
    PostFormResponse {
        form: PostFormValues {
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            is_published: draft.is_published,
            category_id: draft.category_id,
            location_id: draft.location_id,
            image: draft.image,
        },
        categories: choices.categories.iter().map(category).collect(),
        locations: choices.locations.iter().map(location).collect(),
    }
}
